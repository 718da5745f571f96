//! Diesel table definitions mirroring `backend/migrations`.

diesel::table! {
    users (id) {
        id -> Int8,
        name -> Varchar,
        email -> Varchar,
        hashed_password -> Varchar,
        created -> Timestamptz,
        owner -> Bool,
    }
}

diesel::table! {
    snippets (id) {
        id -> Int8,
        title -> Varchar,
        content -> Text,
        created -> Timestamptz,
        expires -> Timestamptz,
    }
}

diesel::table! {
    reviews (user_id, snippet_id) {
        user_id -> Int8,
        snippet_id -> Int8,
        review -> Int4,
    }
}

diesel::table! {
    sessions (token) {
        token -> Text,
        data -> Text,
        expiry -> Timestamptz,
    }
}

diesel::joinable!(reviews -> users (user_id));
diesel::joinable!(reviews -> snippets (snippet_id));

diesel::allow_tables_to_appear_in_same_query!(users, snippets, reviews, sessions);
