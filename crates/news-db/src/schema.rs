// @generated automatically — table definitions for the source catalog store.

diesel::table! {
    sources (source_id) {
        source_id -> Text,
        name -> Text,
        description -> Nullable<Text>,
        source_type -> Text,
        status -> Text,
        update_interval_seconds -> Int4,
        cache_ttl_seconds -> Int4,
        category -> Nullable<Text>,
        country -> Nullable<Text>,
        language -> Nullable<Text>,
        config -> Jsonb,
        needs_proxy -> Bool,
        proxy_group -> Nullable<Text>,
        last_updated -> Nullable<Timestamptz>,
        last_error -> Nullable<Text>,
        news_count -> Int4,
    }
}

diesel::table! {
    source_stats (id) {
        id -> Int8,
        source_id -> Text,
        api_type -> Text,
        success_rate -> Float8,
        avg_response_time -> Float8,
        last_response_time -> Float8,
        total_requests -> Int8,
        error_count -> Int8,
        news_count -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    categories (id) {
        id -> Int4,
        slug -> Text,
        name -> Text,
        description -> Nullable<Text>,
    }
}

diesel::table! {
    proxy_configs (id) {
        id -> Int4,
        name -> Text,
        protocol -> Text,
        host -> Text,
        port -> Int4,
        username -> Nullable<Text>,
        password -> Nullable<Text>,
        proxy_group -> Text,
        status -> Text,
        priority -> Int4,
        avg_response_time -> Nullable<Float8>,
        last_check_time -> Nullable<Timestamptz>,
        last_error -> Nullable<Text>,
    }
}
