//! Diesel table definitions for the session database.

diesel::table! {
    sessions (session_id) {
        session_id -> Text,
        state_json -> Text,
        created_at -> Double,
        updated_at -> Double,
    }
}

diesel::table! {
    messages (id) {
        id -> BigInt,
        session_id -> Text,
        role -> Text,
        content -> Text,
        ts -> Double,
    }
}
