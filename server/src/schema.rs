//! Diesel table definitions for the release-management backend.
//!
//! Tables: apps, iterations, users, members, publishes, publish_logs,
//! reviews. Status-code columns store raw registry codes (see `registry`);
//! the registries themselves are compile-time constants, not tables.

diesel::table! {
    apps (id) {
        id -> Int8,
        app_name -> Varchar,
        description -> Text,
        app_logo -> Varchar,
        repository -> Varchar,
        version -> Varchar,
        daily_address -> Varchar,
        online_address -> Varchar,
        page_prefix -> Varchar,
        port -> Nullable<Int8>,
        publish_type -> Varchar,
        product_type -> Varchar,
        progressing_iteration_count -> Int4,
        creator_id -> Int8,
        create_time -> Timestamptz,
    }
}

diesel::table! {
    iterations (id) {
        id -> Int8,
        app_id -> Int8,
        iteration_name -> Varchar,
        branch -> Varchar,
        version -> Varchar,
        create_time -> Timestamptz,
    }
}

diesel::table! {
    users (id) {
        id -> Int8,
        user_name -> Varchar,
        user_avatar -> Varchar,
    }
}

diesel::table! {
    members (id) {
        id -> Int8,
        app_id -> Int8,
        user_id -> Int8,
        role -> Varchar,
        join_time -> Timestamptz,
        expired_time -> Timestamptz,
    }
}

diesel::table! {
    publishes (id) {
        id -> Int8,
        app_id -> Int8,
        iteration_id -> Int8,
        publisher_id -> Int8,
        commit -> Varchar,
        environment -> Varchar,
        status -> Varchar,
        log_id -> Int8,
        review_id -> Nullable<Int8>,
        create_time -> Timestamptz,
    }
}

diesel::table! {
    publish_logs (id) {
        id -> Int8,
        content -> Text,
    }
}

diesel::table! {
    reviews (id) {
        id -> Int8,
        review_status -> Varchar,
        fail_reason -> Nullable<Text>,
    }
}

// Foreign key relationships
diesel::joinable!(iterations -> apps (app_id));
diesel::joinable!(members -> apps (app_id));
diesel::joinable!(members -> users (user_id));
diesel::joinable!(publishes -> apps (app_id));
diesel::joinable!(publishes -> iterations (iteration_id));
diesel::joinable!(publishes -> users (publisher_id));
diesel::joinable!(publishes -> publish_logs (log_id));
diesel::joinable!(publishes -> reviews (review_id));

diesel::allow_tables_to_appear_in_same_query!(
    apps,
    iterations,
    users,
    members,
    publishes,
    publish_logs,
    reviews,
);
