// Dashboard service
// Typed access to the shared-expense dashboard endpoints

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::unwrap_envelope;
use crate::error::ApiError;
use crate::http_client::ApiClient;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub overview: DashboardOverview,
    pub summary: MonthSummary,
    pub category_breakdown: Vec<CategoryBreakdown>,
    pub payer_breakdown: Vec<PayerBreakdown>,
    pub upcoming_payments: Vec<UpcomingPayment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub total_expenses: f64,
    pub total_pending: f64,
    pub total_paid: f64,
    pub monthly_average: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub month: String,
    pub year: i32,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub pending_amount: f64,
    pub expenses_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category_id: String,
    pub category_name: String,
    pub amount: f64,
    pub percentage: f64,
    pub color: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayerBreakdown {
    pub payer_id: String,
    pub payer_name: String,
    pub amount: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingPayment {
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub due_date: DateTime<Utc>,
    pub payer_name: String,
    pub category_name: String,
    pub status: PaymentStatus,
    pub expense_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Overdue,
}

/// Month/year pair selecting a dashboard period
#[derive(Debug, Clone, Copy)]
pub struct DashboardPeriod {
    pub month: u32,
    pub year: i32,
}

/// Read side of the dashboard, issued through the authenticated pipeline
pub struct DashboardService {
    api: Arc<ApiClient>,
}

impl DashboardService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetch the dashboard, optionally scoped to a month
    pub async fn fetch(&self, period: Option<DashboardPeriod>) -> Result<DashboardData, ApiError> {
        let response = match period {
            Some(p) => {
                let query = [("month", p.month.to_string()), ("year", p.year.to_string())];
                self.api.get_with_query("/dashboard", &query).await?
            }
            None => self.api.get("/dashboard").await?,
        };

        unwrap_envelope(response).await
    }

    /// Mark a pending payment as settled
    pub async fn mark_payment_paid(&self, payment_id: &str) -> Result<(), ApiError> {
        self.api
            .post_empty(&format!("/payments/{}/mark-as-paid", payment_id))
            .await?;
        Ok(())
    }
}
