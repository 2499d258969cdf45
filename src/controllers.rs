use super::{
    auth,
    components::{self, Component},
    errors::ServerError,
    extractors::CurrentUser,
    htmx,
    models::{
        new_id, AppState, Appointment, AppointmentStatus, Client, ClientType,
        Invoice, InvoiceStatus, MileageLog, SettingsPatch, User,
    },
    session,
    shell::ViewOutcome,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use uuid::Uuid;

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// Lenient number parsing for form fields: `$1,250.00` and `1250` both
/// work; anything non-finite does not.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "Sign in first").into_response()
}

/// Re-render whatever view is active, after a mutation.
async fn render_current(state: &AppState, user: &User) -> String {
    let view = state.shell.lock().await.current_view();
    let doc = state.store.snapshot();
    components::render_guarded(&components::ActiveView {
        view,
        user: Some(user),
        doc: &doc,
        today: today(),
    })
}

/// Ship pending fragment writes to the browser. Only the last one matters;
/// the browser would overwrite the earlier ones straight away.
fn outbox(writes: &[String]) -> String {
    components::Outbox {
        fragment: writes.last().map(|s| s.as_str()),
    }
    .render()
}

pub async fn root() -> impl IntoResponse {
    components::Page { title: "Bizdesk" }.render()
}

#[derive(Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    fragment: String,
}

/// Fragment-change notification from the browser. Answers with the view to
/// show, or with a redirect if the auth gate (or anything else) asked for a
/// fragment write.
pub async fn view(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(ViewQuery { fragment }): Query<ViewQuery>,
    headers: HeaderMap,
) -> Response {
    if !htmx::is_htmx_request(&headers) {
        // someone opened the endpoint directly; give them the app instead
        return Redirect::to("/").into_response();
    }
    let outcome = state
        .shell
        .lock()
        .await
        .report_fragment(&fragment, user.as_ref());
    let view = match outcome {
        ViewOutcome::Show(view) => view,
        ViewOutcome::Redirect(next) => {
            return components::Redirecting { fragment: &next }
                .render()
                .into_response();
        }
    };
    let doc = state.store.snapshot();
    components::render_guarded(&components::ActiveView {
        view,
        user: user.as_ref(),
        doc: &doc,
        today: today(),
    })
    .into_response()
}

#[derive(Deserialize)]
pub struct NavigateForm {
    to: String,
}
pub async fn navigate(
    State(state): State<AppState>,
    Form(NavigateForm { to }): Form<NavigateForm>,
) -> impl IntoResponse {
    let writes = {
        let mut shell = state.shell.lock().await;
        shell.navigate(&to);
        shell.take_fragment_writes()
    };
    outbox(&writes)
}

#[derive(Deserialize)]
pub struct SignInForm {
    name: String,
    email: String,
}
pub async fn sign_in(
    State(state): State<AppState>,
    Form(SignInForm { name, email }): Form<SignInForm>,
) -> Result<Response, ServerError> {
    let session = match auth::authenticate(&name, &email) {
        Ok(s) => s,
        Err(e) => {
            state.notifier.error(e.to_string());
            return Ok((htmx::trigger_toasts(), "").into_response());
        }
    };
    tracing::info!(user = %session.user.name, "signed in");
    let token =
        session::serialize_session(&session, &state.config.session_secret);
    let writes = {
        let mut shell = state.shell.lock().await;
        shell.on_user_change(Some(&session.user));
        shell.navigate("dashboard");
        shell.take_fragment_writes()
    };
    state
        .notifier
        .success(format!("Welcome, {}", session.user.name));

    let mut headers = htmx::trigger_toasts();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&session::set_cookie_header(&token))?,
    );
    Ok((headers, outbox(&writes)).into_response())
}

pub async fn sign_out(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServerError> {
    let writes = {
        let mut shell = state.shell.lock().await;
        shell.on_user_change(None);
        shell.take_fragment_writes()
    };
    state.notifier.info("Signed out");

    let mut headers = htmx::trigger_toasts();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&session::clear_cookie_header())?,
    );
    Ok((headers, outbox(&writes)))
}

pub async fn toasts(State(state): State<AppState>) -> impl IntoResponse {
    components::ToastTray {
        toasts: &state.notifier.active(),
    }
    .render()
}

pub async fn dismiss_toast(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    state.notifier.dismiss(id);
    components::ToastTray {
        toasts: &state.notifier.active(),
    }
    .render()
}

#[derive(Debug, Deserialize)]
pub struct ClientForm {
    pub name: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub kind: Option<String>,
}
impl ClientForm {
    pub fn into_client(self) -> Result<Client, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Client name is required");
        }
        Ok(Client {
            contact: non_empty(self.contact).unwrap_or_default(),
            email: non_empty(self.email).unwrap_or_default(),
            phone: non_empty(self.phone).unwrap_or_default(),
            kind: self
                .kind
                .as_deref()
                .and_then(ClientType::from_label)
                .unwrap_or_default(),
            ..Client::new(name)
        })
    }
}
pub async fn add_client(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ClientForm>,
) -> Response {
    let Some(user) = user else {
        return unauthorized();
    };
    match form.into_client() {
        Ok(client) => {
            state.notifier.success(format!("Added {}", client.name));
            state.store.add_client(client);
        }
        Err(message) => {
            state.notifier.error(message);
        }
    };
    (htmx::trigger_toasts(), render_current(&state, &user).await)
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct AppointmentForm {
    pub client_name: String,
    pub kind: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub amount: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}
impl AppointmentForm {
    pub fn into_appointment(self) -> Result<Appointment, &'static str> {
        let client_name = self.client_name.trim();
        if client_name.is_empty() {
            return Err("Pick a client for the appointment");
        }
        let amount = match non_empty(self.amount) {
            Some(raw) => parse_amount(&raw).ok_or("Fee must be a number")?,
            None => 0.0,
        };
        Ok(Appointment {
            id: new_id(),
            client_name: client_name.to_string(),
            kind: non_empty(self.kind).unwrap_or_default(),
            date: non_empty(self.date).unwrap_or_default(),
            time: non_empty(self.time).unwrap_or_default(),
            status: non_empty(self.status)
                .map(AppointmentStatus::from)
                .unwrap_or_default(),
            amount,
            location: non_empty(self.location).unwrap_or_default(),
        })
    }
}
pub async fn add_appointment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<AppointmentForm>,
) -> Response {
    let Some(user) = user else {
        return unauthorized();
    };
    match form.into_appointment() {
        Ok(appointment) => {
            state.notifier.success("Appointment scheduled");
            state.store.add_appointment(appointment);
        }
        Err(message) => {
            state.notifier.error(message);
        }
    };
    (htmx::trigger_toasts(), render_current(&state, &user).await)
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct InvoiceForm {
    pub client: String,
    pub amount: String,
    pub date: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<String>,
}
impl InvoiceForm {
    /// The id is left blank; the store assigns the invoice code.
    pub fn into_invoice(self) -> Result<Invoice, &'static str> {
        let client = self.client.trim();
        if client.is_empty() {
            return Err("Pick a client for the invoice");
        }
        let amount = parse_amount(&self.amount).ok_or("Amount must be a number")?;
        Ok(Invoice {
            id: String::new(),
            client: client.to_string(),
            amount,
            date: non_empty(self.date).unwrap_or_default(),
            due_date: non_empty(self.due_date).unwrap_or_default(),
            status: self
                .status
                .as_deref()
                .and_then(InvoiceStatus::from_label)
                .unwrap_or_default(),
        })
    }
}
pub async fn add_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<InvoiceForm>,
) -> Response {
    let Some(user) = user else {
        return unauthorized();
    };
    match form.into_invoice() {
        Ok(invoice) => {
            let invoice = state.store.issue_invoice(invoice);
            state.notifier.success(format!("Created {}", invoice.id));
        }
        Err(message) => {
            state.notifier.error(message);
        }
    };
    (htmx::trigger_toasts(), render_current(&state, &user).await)
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct MileageForm {
    pub date: Option<String>,
    pub destination: String,
    pub purpose: Option<String>,
    pub miles: String,
}
impl MileageForm {
    pub fn into_log(self) -> Result<MileageLog, &'static str> {
        let destination = self.destination.trim();
        if destination.is_empty() {
            return Err("Destination is required");
        }
        let miles = parse_amount(&self.miles).ok_or("Miles must be a number")?;
        Ok(MileageLog {
            id: new_id(),
            date: non_empty(self.date).unwrap_or_default(),
            destination: destination.to_string(),
            purpose: non_empty(self.purpose).unwrap_or_default(),
            miles: miles.max(0.0),
        })
    }
}
pub async fn add_mileage_log(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<MileageForm>,
) -> Response {
    let Some(user) = user else {
        return unauthorized();
    };
    match form.into_log() {
        Ok(log) => {
            state
                .notifier
                .success(format!("Logged {:.1} miles", log.miles));
            state.store.add_mileage_log(log);
        }
        Err(message) => {
            state.notifier.error(message);
        }
    };
    (htmx::trigger_toasts(), render_current(&state, &user).await)
        .into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsForm {
    pub owner_name: Option<String>,
    pub business_name: Option<String>,
    pub cost_per_mile: Option<String>,
    pub tax_rate: Option<String>,
    pub monthly_goal: Option<String>,
}
impl SettingsForm {
    /// Blank fields are left alone. Unparseable numbers are reported by
    /// field name and left alone too.
    pub fn into_patch(self) -> (SettingsPatch, Vec<&'static str>) {
        let mut rejected = Vec::new();
        let mut number = |raw: Option<String>, field: &'static str| {
            let raw = non_empty(raw)?;
            let parsed = parse_amount(&raw).filter(|v| *v >= 0.0);
            if parsed.is_none() {
                rejected.push(field);
            }
            parsed
        };
        let patch = SettingsPatch {
            cost_per_mile: number(self.cost_per_mile, "cost per mile"),
            tax_rate: number(self.tax_rate, "tax rate"),
            monthly_goal: number(self.monthly_goal, "monthly goal"),
            owner_name: non_empty(self.owner_name),
            business_name: non_empty(self.business_name),
        };
        (patch, rejected)
    }
}
pub async fn update_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<SettingsForm>,
) -> Response {
    let Some(user) = user else {
        return unauthorized();
    };
    let (patch, rejected) = form.into_patch();
    if !rejected.is_empty() {
        state
            .notifier
            .error(format!("Not a valid number: {}", rejected.join(", ")));
    }
    if patch != SettingsPatch::default() {
        state.store.update_settings(patch);
        state.notifier.success("Settings saved");
    }
    (htmx::trigger_toasts(), render_current(&state, &user).await)
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("150"), Some(150.0));
        assert_eq!(parse_amount(" $1,250.50 "), Some(1250.5));
        assert_eq!(parse_amount("-3"), Some(-3.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_client_form_requires_name() {
        let form = ClientForm {
            name: "   ".to_string(),
            contact: None,
            email: None,
            phone: None,
            kind: None,
        };
        assert!(form.into_client().is_err());

        let client = ClientForm {
            name: " Acme ".to_string(),
            contact: Some("".to_string()),
            email: Some("ops@acme.test".to_string()),
            phone: None,
            kind: Some("Title Company".to_string()),
        }
        .into_client()
        .expect("name given");
        assert_eq!(client.name, "Acme");
        assert_eq!(client.contact, "");
        assert_eq!(client.email, "ops@acme.test");
        assert_eq!(client.kind, ClientType::TitleCompany);
        assert!(!client.id.is_empty());
    }

    #[test]
    fn test_appointment_form() {
        let appt = AppointmentForm {
            client_name: "Acme".to_string(),
            kind: Some("Loan Signing".to_string()),
            date: Some("2025-07-01".to_string()),
            time: Some("09:30".to_string()),
            amount: Some("$125".to_string()),
            location: None,
            status: Some("rescheduled".to_string()),
        }
        .into_appointment()
        .expect("valid");
        assert_eq!(appt.amount, 125.0);
        assert_eq!(appt.status, AppointmentStatus::Other("rescheduled".into()));

        let bad_fee = AppointmentForm {
            client_name: "Acme".to_string(),
            kind: None,
            date: None,
            time: None,
            amount: Some("lots".to_string()),
            location: None,
            status: None,
        };
        assert!(bad_fee.into_appointment().is_err());
    }

    #[test]
    fn test_invoice_form() {
        let invoice = InvoiceForm {
            client: "Acme".to_string(),
            amount: "900".to_string(),
            date: None,
            due_date: None,
            status: Some("Overdue".to_string()),
        }
        .into_invoice()
        .expect("valid");
        assert!(invoice.id.is_empty());
        assert_eq!(invoice.amount, 900.0);
        assert_eq!(invoice.status, InvoiceStatus::Overdue);

        let no_amount = InvoiceForm {
            client: "Acme".to_string(),
            amount: "".to_string(),
            date: None,
            due_date: None,
            status: None,
        };
        assert!(no_amount.into_invoice().is_err());
    }

    #[test]
    fn test_mileage_form_clamps_negative_miles() {
        let log = MileageForm {
            date: None,
            destination: "Courthouse".to_string(),
            purpose: None,
            miles: "-4".to_string(),
        }
        .into_log()
        .expect("valid");
        assert_eq!(log.miles, 0.0);
    }

    #[test]
    fn test_settings_form_only_sets_filled_fields() {
        let (patch, rejected) = SettingsForm {
            tax_rate: Some("20".to_string()),
            monthly_goal: Some("lots".to_string()),
            owner_name: Some("  ".to_string()),
            ..Default::default()
        }
        .into_patch();
        assert_eq!(
            patch,
            SettingsPatch {
                tax_rate: Some(20.0),
                ..Default::default()
            }
        );
        assert_eq!(rejected, vec!["monthly goal"]);
    }
}
