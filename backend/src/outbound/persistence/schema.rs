//! Diesel table definitions mirroring `backend/migrations`.

diesel::table! {
    subscriptions (id) {
        id -> Uuid,
        user_id -> Uuid,
        monthly_price -> Int4,
        status -> Text,
        discount_applied -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    cancellations (id) {
        id -> Uuid,
        user_id -> Uuid,
        subscription_id -> Uuid,
        downsell_variant -> Text,
        reason -> Nullable<Text>,
        accepted_downsell -> Bool,
        created_at -> Timestamptz,
        decided_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(cancellations -> subscriptions (subscription_id));

diesel::allow_tables_to_appear_in_same_query!(cancellations, subscriptions);
