//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//! All tables live in the dedicated `campuspay` schema.

diesel::table! {
    /// Student records, the aggregate root.
    ///
    /// `version` backs optimistic concurrency: writes only apply when the
    /// caller supplies the currently persisted value.
    campuspay.students (id) {
        /// Primary key, sequence-assigned.
        id -> Int4,
        /// Optimistic-lock counter, starts at 0 and increments on update.
        version -> Int4,
        /// Unique matriculation number (4 to 8 digits).
        matriculation_number -> Varchar,
        /// Given name.
        first_name -> Varchar,
        /// Family name.
        last_name -> Varchar,
        /// Unique contact address.
        email -> Varchar,
        /// Current semester, at least 1.
        semester -> Int4,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Campus-card wallets, at most one per student.
    campuspay.wallets (id) {
        /// Primary key, sequence-assigned.
        id -> Int4,
        /// Optimistic-lock counter.
        version -> Int4,
        /// Current balance in euros.
        balance -> Numeric,
        /// Whether the wallet tops itself up automatically.
        auto_reload -> Bool,
        /// Balance at which an automatic top-up triggers.
        reload_threshold -> Numeric,
        /// Amount credited by an automatic top-up.
        reload_amount -> Numeric,
        /// When the wallet last topped up, if ever.
        last_reloaded_at -> Nullable<Timestamptz>,
        /// Owning student; unique, cascades on delete.
        student_id -> Int4,
    }
}

diesel::table! {
    /// Payment history entries.
    campuspay.transactions (id) {
        /// Primary key, sequence-assigned.
        id -> Int4,
        /// Signed amount in euros, never zero.
        amount -> Numeric,
        /// Transaction kind: LOAD, SPEND, or REFUND.
        kind -> Varchar,
        /// Optional free-text reference.
        reference -> Nullable<Varchar>,
        /// Optional point-of-sale location.
        location -> Nullable<Varchar>,
        /// When the payment happened.
        recorded_at -> Timestamptz,
        /// Owning student; cascades on delete.
        student_id -> Int4,
    }
}

diesel::table! {
    /// Uploaded document per student, at most one row each.
    campuspay.student_files (id) {
        /// Primary key, sequence-assigned.
        id -> Int4,
        /// Owning student; unique, cascades on delete.
        student_id -> Int4,
        /// Client-supplied filename used for downloads.
        filename -> Varchar,
        /// Sniffed media type served on download.
        media_type -> Varchar,
        /// Raw file bytes.
        content -> Bytea,
        /// When the file was stored.
        uploaded_at -> Timestamptz,
    }
}

diesel::joinable!(wallets -> students (student_id));
diesel::joinable!(transactions -> students (student_id));
diesel::joinable!(student_files -> students (student_id));

diesel::allow_tables_to_appear_in_same_query!(students, wallets, transactions, student_files);
