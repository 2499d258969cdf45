use super::{
    config::Config, notifications::Notifier, shell::Shell,
    store::StoreAccessor,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Everything a request handler can reach. Built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StoreAccessor>,
    pub shell: Arc<Mutex<Shell>>,
    pub notifier: Arc<Notifier>,
    pub config: Arc<Config>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
}

/// The whole persisted application state. Collections are newest-first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub appointments: Vec<Appointment>,
    pub clients: Vec<Client>,
    pub invoices: Vec<Invoice>,
    pub mileage_logs: Vec<MileageLog>,
    pub settings: Settings,
}

/// Appointment status is an open set: anything we don't recognize is kept
/// verbatim so it survives a load/flush cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppointmentStatus {
    #[default]
    Upcoming,
    Completed,
    Cancelled,
    Other(String),
}

impl From<String> for AppointmentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "upcoming" => Self::Upcoming,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Other(s),
        }
    }
}

impl From<AppointmentStatus> for String {
    fn from(s: AppointmentStatus) -> Self {
        s.as_str().to_string()
    }
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other(s) => s,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub client_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    pub time: String,
    pub status: AppointmentStatus,
    pub amount: f64,
    pub location: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientType {
    #[default]
    Individual,
    Corporate,
    #[serde(rename = "Title Company")]
    TitleCompany,
}

impl ClientType {
    pub const ALL: [ClientType; 3] =
        [Self::Individual, Self::Corporate, Self::TitleCompany];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Individual => "Individual",
            Self::Corporate => "Corporate",
            Self::TitleCompany => "Title Company",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
}

impl ClientStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

/// Only `name` is required when a client is created; everything else may
/// be filled in later (or never).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub contact: String,
    pub email: String,
    pub phone: String,
    #[serde(rename = "type")]
    pub kind: ClientType,
    pub status: ClientStatus,
}

impl Client {
    pub fn new(name: &str) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Paid,
    #[default]
    Pending,
    Overdue,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 3] = [Self::Paid, Self::Pending, Self::Overdue];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Pending => "Pending",
            Self::Overdue => "Overdue",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

/// `client` is the client's display name, not a reference to a `Client`
/// id. Renaming a client does not touch its old invoices.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub client: String,
    pub amount: f64,
    pub date: String,
    pub due_date: String,
    pub status: InvoiceStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MileageLog {
    pub id: String,
    pub date: String,
    pub destination: String,
    pub purpose: String,
    pub miles: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub owner_name: String,
    pub business_name: String,
    pub cost_per_mile: f64,
    pub tax_rate: f64,
    pub monthly_goal: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            owner_name: "Jordan Ellis".to_string(),
            business_name: "Ellis Mobile Notary".to_string(),
            cost_per_mile: 0.67,
            tax_rate: 25.0,
            monthly_goal: 15000.0,
        }
    }
}

/// A partial settings update. Keys left as `None` are not touched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsPatch {
    pub owner_name: Option<String>,
    pub business_name: Option<String>,
    pub cost_per_mile: Option<f64>,
    pub tax_rate: Option<f64>,
    pub monthly_goal: Option<f64>,
}

impl SettingsPatch {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(v) = &self.owner_name {
            settings.owner_name = v.clone();
        }
        if let Some(v) = &self.business_name {
            settings.business_name = v.clone();
        }
        if let Some(v) = self.cost_per_mile {
            settings.cost_per_mile = v;
        }
        if let Some(v) = self.tax_rate {
            settings.tax_rate = v;
        }
        if let Some(v) = self.monthly_goal {
            settings.monthly_goal = v;
        }
    }
}

impl Default for Document {
    /// The demonstration document a fresh install starts with.
    fn default() -> Self {
        Self {
            appointments: vec![
                Appointment {
                    id: "apt-2".to_string(),
                    client_name: "Riverside Title Co.".to_string(),
                    kind: "Loan Signing".to_string(),
                    date: "2025-06-12".to_string(),
                    time: "10:00".to_string(),
                    status: AppointmentStatus::Upcoming,
                    amount: 150.0,
                    location: "1420 Oak Ave, Springfield".to_string(),
                },
                Appointment {
                    id: "apt-1".to_string(),
                    client_name: "Maria Gonzalez".to_string(),
                    kind: "Power of Attorney".to_string(),
                    date: "2025-06-10".to_string(),
                    time: "14:30".to_string(),
                    status: AppointmentStatus::Completed,
                    amount: 75.0,
                    location: "Client residence".to_string(),
                },
            ],
            clients: vec![
                Client {
                    id: "cl-2".to_string(),
                    name: "Riverside Title Co.".to_string(),
                    contact: "Dana Whitfield".to_string(),
                    email: "closings@riversidetitle.example".to_string(),
                    phone: "(555) 201-4400".to_string(),
                    kind: ClientType::TitleCompany,
                    status: ClientStatus::Active,
                },
                Client {
                    id: "cl-1".to_string(),
                    name: "Maria Gonzalez".to_string(),
                    contact: "Maria Gonzalez".to_string(),
                    email: "maria.g@example.com".to_string(),
                    phone: "(555) 310-8812".to_string(),
                    kind: ClientType::Individual,
                    status: ClientStatus::Active,
                },
            ],
            invoices: vec![
                Invoice {
                    id: "INV-002".to_string(),
                    client: "Riverside Title Co.".to_string(),
                    amount: 450.0,
                    date: "2025-06-01".to_string(),
                    due_date: "2025-07-01".to_string(),
                    status: InvoiceStatus::Pending,
                },
                Invoice {
                    id: "INV-001".to_string(),
                    client: "Maria Gonzalez".to_string(),
                    amount: 75.0,
                    date: "2025-05-20".to_string(),
                    due_date: "2025-06-19".to_string(),
                    status: InvoiceStatus::Paid,
                },
            ],
            mileage_logs: vec![
                MileageLog {
                    id: "ml-2".to_string(),
                    date: "2025-06-10".to_string(),
                    destination: "Maria Gonzalez residence".to_string(),
                    purpose: "Power of Attorney signing".to_string(),
                    miles: 18.4,
                },
                MileageLog {
                    id: "ml-1".to_string(),
                    date: "2025-06-03".to_string(),
                    destination: "Riverside Title Co.".to_string(),
                    purpose: "Document pickup".to_string(),
                    miles: 9.2,
                },
            ],
            settings: Settings::default(),
        }
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// One past the highest `INV-NNN` code in `invoices`. Codes that don't
/// follow the pattern are ignored. If the numbering is exhausted the code
/// falls back to a random suffix, which is still unique.
pub fn next_invoice_code(invoices: &[Invoice]) -> String {
    let highest = invoices
        .iter()
        .filter_map(|i| i.id.strip_prefix("INV-"))
        .filter_map(|n| n.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    match highest.checked_add(1) {
        Some(next) => format!("INV-{next:03}"),
        None => format!("INV-{}", new_id()),
    }
}

/// Stored dates are whatever the user typed; only ISO dates count toward
/// date-based figures.
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

#[derive(Clone, Debug, PartialEq)]
pub struct DashboardSummary {
    pub upcoming_appointments: usize,
    pub revenue_this_month: f64,
    pub outstanding: f64,
    pub total_miles: f64,
    pub mileage_deduction: f64,
    pub estimated_tax: f64,
    /// Percent of the monthly goal reached, capped at 100
    pub goal_progress: f64,
}

impl DashboardSummary {
    pub fn from_document(doc: &Document, today: NaiveDate) -> Self {
        let upcoming_appointments = doc
            .appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Upcoming)
            .count();
        let revenue_this_month = doc
            .invoices
            .iter()
            .filter(|i| i.status == InvoiceStatus::Paid)
            .filter(|i| {
                parse_date(&i.date).is_some_and(|d| {
                    d.year() == today.year() && d.month() == today.month()
                })
            })
            .map(|i| i.amount)
            .sum::<f64>();
        let outstanding = doc
            .invoices
            .iter()
            .filter(|i| i.status != InvoiceStatus::Paid)
            .map(|i| i.amount)
            .sum();
        let total_miles = doc.mileage_logs.iter().map(|m| m.miles).sum::<f64>();
        let settings = &doc.settings;
        let goal_progress = if settings.monthly_goal > 0.0 {
            (revenue_this_month / settings.monthly_goal * 100.0).min(100.0)
        } else {
            0.0
        };

        Self {
            upcoming_appointments,
            revenue_this_month,
            outstanding,
            total_miles,
            mileage_deduction: total_miles * settings.cost_per_mile,
            estimated_tax: revenue_this_month * settings.tax_rate / 100.0,
            goal_progress,
        }
    }
}
