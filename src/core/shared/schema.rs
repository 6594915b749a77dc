diesel::table! {
    prospects (company_id) {
        company_id -> Varchar,
        company_name -> Varchar,
        contact_name -> Nullable<Varchar>,
        contact_email -> Nullable<Varchar>,
        contact_phone -> Nullable<Varchar>,
        industry -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    qbo_tokens (company_id) {
        company_id -> Varchar,
        access_token -> Text,
        refresh_token -> Text,
        expires_at -> Timestamptz,
        refresh_token_expires_at -> Nullable<Timestamptz>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    financial_snapshots (id) {
        id -> Uuid,
        company_id -> Varchar,
        revenue -> Float8,
        expenses -> Float8,
        net_income -> Float8,
        total_assets -> Float8,
        total_liabilities -> Float8,
        total_equity -> Float8,
        profit_margin -> Float8,
        debt_to_equity -> Float8,
        raw_reports -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    call_transcripts (id) {
        id -> Uuid,
        company_id -> Varchar,
        file_name -> Varchar,
        file_type -> Nullable<Varchar>,
        file_size -> Nullable<Int8>,
        participants -> Array<Text>,
        call_date -> Nullable<Timestamptz>,
        content -> Text,
        analysis -> Nullable<Jsonb>,
        sales_score -> Nullable<Int4>,
        analyzed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    generated_reports (id) {
        id -> Uuid,
        company_id -> Varchar,
        report_type -> Varchar,
        title -> Varchar,
        content -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    ai_analyses (id) {
        id -> Uuid,
        company_id -> Varchar,
        analysis_type -> Varchar,
        source -> Varchar,
        fallback_reason -> Nullable<Text>,
        result -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    sales_activities (id) {
        id -> Uuid,
        company_id -> Varchar,
        activity_type -> Varchar,
        description -> Text,
        outcome -> Nullable<Text>,
        occurred_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    industry_benchmarks (industry) {
        industry -> Varchar,
        avg_profit_margin -> Float8,
        avg_debt_to_equity -> Float8,
        avg_revenue_growth -> Float8,
        notes -> Nullable<Text>,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(qbo_tokens -> prospects (company_id));
diesel::joinable!(financial_snapshots -> prospects (company_id));
diesel::joinable!(call_transcripts -> prospects (company_id));
diesel::joinable!(generated_reports -> prospects (company_id));
diesel::joinable!(ai_analyses -> prospects (company_id));
diesel::joinable!(sales_activities -> prospects (company_id));

diesel::allow_tables_to_appear_in_same_query!(
    prospects,
    qbo_tokens,
    financial_snapshots,
    call_transcripts,
    generated_reports,
    ai_analyses,
    sales_activities,
    industry_benchmarks,
);
