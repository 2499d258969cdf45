// In many cases, we need to do a let binding to satisfy the borrow checker
// and for some reason, clippy identifies those as unnecessary. Maybe there
// are and clippy knows more than me, maybe not.
#![allow(clippy::let_and_return)]

use super::{
    models::{
        next_invoice_code, Appointment, AppointmentStatus, Client, ClientType,
        DashboardSummary, Document, Invoice, InvoiceStatus, MileageLog,
        Settings, User,
    },
    navigation::View,
    notifications::{Toast, ToastKind},
};
use ammonia::{clean, clean_text};
use chrono::NaiveDate;
use std::{
    fmt::Write,
    panic::{catch_unwind, AssertUnwindSafe},
};

/// Reports every fragment change to the server, which answers with the view
/// to show. This is the only place the browser's `hashchange` is observed.
const FRAGMENT_SYNC_SCRIPT: &str = r#"<script>
    function reportFragment() {
        htmx.ajax(
            'GET',
            '/view?fragment=' + encodeURIComponent(window.location.hash),
            { target: '#app', swap: 'innerHTML' }
        );
    }
    window.addEventListener('hashchange', reportFragment);
    document.addEventListener('DOMContentLoaded', reportFragment);
</script>"#;

pub trait Component {
    /// Render the component to a HTML string. By convention, the
    /// implementation should sanitize all string properties at render-time
    fn render(&self) -> String;
}

/// Render a view, containing any panic inside it. One broken view should
/// cost the user that view, not the whole page.
pub fn render_guarded(component: &dyn Component) -> String {
    match catch_unwind(AssertUnwindSafe(|| component.render())) {
        Ok(html) => html,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(reason = %reason, "view failed to render");
            RecoveryNotice {}.render()
        }
    }
}

pub struct Page<'a> {
    pub title: &'a str,
}
impl Component for Page<'_> {
    fn render(&self) -> String {
        format!(
            r#"
            <html>
                <head>
                    <meta name="viewport" content="width=device-width, initial-scale=1.0"></meta>
                    <title>{title}</title>
                    <script src="https://unpkg.com/htmx.org@1.9.6"></script>
                </head>
                <body>
                    <div id="outbox"></div>
                    <div
                        id="toasts"
                        hx-get="/toasts"
                        hx-trigger="load, every 1s, toasts-changed from:body"
                    ></div>
                    <main id="app">Loading...</main>
                    {FRAGMENT_SYNC_SCRIPT}
                </body>
            </html>
            "#,
            title = clean(self.title),
        )
    }
}

pub struct RecoveryNotice {}
impl Component for RecoveryNotice {
    fn render(&self) -> String {
        r#"
        <div role="alert" class="recovery">
            <h2>Something went wrong showing this page.</h2>
            <p>Your data is safe. Reloading usually fixes this.</p>
            <button onclick="window.location.reload()">Reload</button>
        </div>
        "#
        .to_string()
    }
}

/// Carries a fragment write back to the browser. `None` means "the fragment
/// didn't change, but report it again so the view refreshes".
pub struct Outbox<'a> {
    pub fragment: Option<&'a str>,
}
impl Component for Outbox<'_> {
    fn render(&self) -> String {
        match self.fragment {
            Some(fragment) => {
                // fragments only ever come from View::fragment, but keep
                // anything odd out of the script anyway
                let fragment: String = fragment
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric() || "#/-_".contains(*c))
                    .collect();
                format!(
                    r#"<script>
                        if (window.location.hash === "{fragment}") {{
                            reportFragment();
                        }} else {{
                            window.location.hash = "{fragment}";
                        }}
                    </script>"#
                )
            }
            None => "<script>reportFragment();</script>".to_string(),
        }
    }
}

pub struct Redirecting<'a> {
    pub fragment: &'a str,
}
impl Component for Redirecting<'_> {
    fn render(&self) -> String {
        let outbox = Outbox {
            fragment: Some(self.fragment),
        }
        .render();
        format!(r#"<p class="muted">Redirecting...</p>{outbox}"#)
    }
}

pub struct ToastTray<'a> {
    pub toasts: &'a [Toast],
}
impl Component for ToastTray<'_> {
    fn render(&self) -> String {
        self.toasts.iter().fold(String::new(), |mut out, toast| {
            let kind = match toast.kind {
                ToastKind::Success => "success",
                ToastKind::Error => "error",
                ToastKind::Info => "info",
            };
            let _ = write!(
                out,
                r##"<div
                    class="toast toast-{kind}"
                    role="status"
                    hx-post="/toasts/{id}/dismiss"
                    hx-target="#toasts"
                >{message}</div>"##,
                id = toast.id,
                message = clean(&toast.message)
            );
            out
        })
    }
}

struct NavButton {
    target: View,
    label: &'static str,
    active: bool,
}
impl Component for NavButton {
    fn render(&self) -> String {
        let current = if self.active {
            r#" aria-current="page""#
        } else {
            ""
        };
        format!(
            r##"<button
                hx-post="/navigate"
                hx-vals='{{"to": "{to}"}}'
                hx-target="#outbox"
                {current}
            >{label}</button>"##,
            to = self.target.name(),
            label = self.label,
        )
    }
}

pub struct Nav<'a> {
    pub active: View,
    pub user: Option<&'a User>,
}
impl Component for Nav<'_> {
    fn render(&self) -> String {
        let links: &[(View, &'static str)] = if self.user.is_some() {
            &[
                (View::Dashboard, "Dashboard"),
                (View::Appointments, "Appointments"),
                (View::Clients, "Clients"),
                (View::Invoices, "Invoices"),
                (View::Mileage, "Mileage"),
                (View::Settings, "Settings"),
            ]
        } else {
            &[(View::Landing, "Home"), (View::Auth, "Sign in")]
        };
        let buttons = links
            .iter()
            .map(|(target, label)| {
                NavButton {
                    target: *target,
                    label: *label,
                    active: *target == self.active,
                }
                .render()
            })
            .collect::<Vec<String>>()
            .join("");
        let account = match self.user {
            Some(user) => format!(
                r##"<span>{name}</span>
                <button hx-post="/auth/sign-out" hx-target="#outbox">Sign out</button>"##,
                name = clean(&user.name)
            ),
            None => "".to_string(),
        };
        format!(r#"<nav>{buttons}{account}</nav>"#)
    }
}

/// The whole `#app` region for the active view.
pub struct ActiveView<'a> {
    pub view: View,
    pub user: Option<&'a User>,
    pub doc: &'a Document,
    pub today: NaiveDate,
}
impl Component for ActiveView<'_> {
    fn render(&self) -> String {
        let doc = self.doc;
        let body = match self.view {
            View::Landing => Landing {
                signed_in: self.user.is_some(),
            }
            .render(),
            View::Auth => AuthView { user: self.user }.render(),
            View::Dashboard => Dashboard {
                doc,
                today: self.today,
            }
            .render(),
            View::Appointments => AppointmentsView {
                appointments: &doc.appointments,
                clients: &doc.clients,
                today: self.today,
            }
            .render(),
            View::Clients => ClientsView {
                clients: &doc.clients,
            }
            .render(),
            View::Invoices => InvoicesView {
                invoices: &doc.invoices,
                clients: &doc.clients,
                today: self.today,
            }
            .render(),
            View::Mileage => MileageView {
                logs: &doc.mileage_logs,
                settings: &doc.settings,
                today: self.today,
            }
            .render(),
            View::Settings => SettingsView {
                settings: &doc.settings,
            }
            .render(),
        };
        let nav = Nav {
            active: self.view,
            user: self.user,
        }
        .render();
        format!(r#"{nav}<section data-view="{}">{body}</section>"#, self.view)
    }
}

pub fn format_money(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();
    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, c) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}${grouped}.{:02}", cents % 100)
}

struct PricingTier {
    name: &'static str,
    monthly: f64,
    blurb: &'static str,
}

const PRICING: [PricingTier; 3] = [
    PricingTier {
        name: "Starter",
        monthly: 0.0,
        blurb: "Appointments, clients and invoices for a one-person shop.",
    },
    PricingTier {
        name: "Professional",
        monthly: 19.0,
        blurb: "Adds mileage tracking, tax estimates and revenue goals.",
    },
    PricingTier {
        name: "Business",
        monthly: 49.0,
        blurb: "Everything in Professional, for teams of signing agents.",
    },
];

pub struct Landing {
    pub signed_in: bool,
}
impl Component for Landing {
    fn render(&self) -> String {
        let cta = if self.signed_in {
            NavButton {
                target: View::Dashboard,
                label: "Go to your dashboard",
                active: false,
            }
            .render()
        } else {
            NavButton {
                target: View::Auth,
                label: "Get started",
                active: false,
            }
            .render()
        };
        let tiers = PRICING.iter().fold(String::new(), |mut out, tier| {
            let _ = write!(
                out,
                r#"
                <div class="tier">
                    <h3>{name}</h3>
                    <p class="price">{price}/mo</p>
                    <p>{blurb}</p>
                </div>
                "#,
                name = tier.name,
                price = format_money(tier.monthly),
                blurb = tier.blurb,
            );
            out
        });
        format!(
            r#"
            <header>
                <h1>Run your notary business from one place</h1>
                <p>Schedule signings, keep client details, send invoices and
                log every business mile.</p>
                {cta}
            </header>
            <section class="pricing">{tiers}</section>
            "#
        )
    }
}

pub struct AuthView<'a> {
    pub user: Option<&'a User>,
}
impl Component for AuthView<'_> {
    fn render(&self) -> String {
        if let Some(user) = self.user {
            return format!(
                r#"<p>You're signed in as {name}.</p>{go}"#,
                name = clean(&user.name),
                go = NavButton {
                    target: View::Dashboard,
                    label: "Continue",
                    active: false,
                }
                .render()
            );
        }
        r##"
        <h1>Sign in</h1>
        <form hx-post="/auth/sign-in" hx-target="#outbox">
            <label for="name">Name</label>
            <input type="text" name="name" id="name" required />
            <label for="email">Email</label>
            <input type="email" name="email" id="email" required />
            <button>Sign in</button>
        </form>
        "##
        .to_string()
    }
}

struct StatCard<'a> {
    label: &'a str,
    value: String,
}
impl Component for StatCard<'_> {
    fn render(&self) -> String {
        format!(
            r#"<div class="card"><p class="label">{}</p><p class="value">{}</p></div>"#,
            self.label,
            clean(&self.value)
        )
    }
}

pub struct Dashboard<'a> {
    pub doc: &'a Document,
    pub today: NaiveDate,
}
impl Component for Dashboard<'_> {
    fn render(&self) -> String {
        let summary = DashboardSummary::from_document(self.doc, self.today);
        let cards = [
            StatCard {
                label: "Upcoming appointments",
                value: summary.upcoming_appointments.to_string(),
            },
            StatCard {
                label: "Revenue this month",
                value: format_money(summary.revenue_this_month),
            },
            StatCard {
                label: "Outstanding",
                value: format_money(summary.outstanding),
            },
            StatCard {
                label: "Mileage deduction",
                value: format!(
                    "{} ({:.1} mi)",
                    format_money(summary.mileage_deduction),
                    summary.total_miles
                ),
            },
            StatCard {
                label: "Estimated tax",
                value: format_money(summary.estimated_tax),
            },
        ]
        .iter()
        .map(|c| c.render())
        .collect::<Vec<String>>()
        .join("");
        let recent = AppointmentTable {
            appointments: &self.doc.appointments
                [..self.doc.appointments.len().min(5)],
        }
        .render();
        format!(
            r#"
            <h1>Welcome back, {owner}</h1>
            <div class="cards">{cards}</div>
            <div class="goal">
                <label for="goal">Monthly goal ({goal})</label>
                <progress id="goal" max="100" value="{progress:.0}"></progress>
            </div>
            <h2>Recent appointments</h2>
            {recent}
            "#,
            owner = clean(&self.doc.settings.owner_name),
            goal = format_money(self.doc.settings.monthly_goal),
            progress = summary.goal_progress,
        )
    }
}

struct StatusBadge<'a> {
    status: &'a str,
}
impl Component for StatusBadge<'_> {
    fn render(&self) -> String {
        // statuses can be anything a stored document says, so the class
        // name only keeps characters that are safe inside the attribute
        let slug: String = self
            .status
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' { '-' } else { c })
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        format!(
            r#"<span class="badge badge-{slug}">{status}</span>"#,
            status = clean(self.status)
        )
    }
}

struct AppointmentTable<'a> {
    appointments: &'a [Appointment],
}
impl Component for AppointmentTable<'_> {
    fn render(&self) -> String {
        if self.appointments.is_empty() {
            return r#"<p class="muted">No appointments yet.</p>"#.to_string();
        }
        let rows = self.appointments.iter().fold(String::new(), |mut out, a| {
            let _ = write!(
                out,
                r#"
                <tr>
                    <td>{date} {time}</td>
                    <td>{client}</td>
                    <td>{kind}</td>
                    <td>{location}</td>
                    <td>{amount}</td>
                    <td>{status}</td>
                </tr>
                "#,
                date = clean(&a.date),
                time = clean(&a.time),
                client = clean(&a.client_name),
                kind = clean(&a.kind),
                location = clean(&a.location),
                amount = format_money(a.amount),
                status = StatusBadge {
                    status: a.status.as_str()
                }
                .render(),
            );
            out
        });
        format!(
            r#"
            <table>
                <thead><tr>
                    <th>When</th><th>Client</th><th>Type</th>
                    <th>Location</th><th>Amount</th><th>Status</th>
                </tr></thead>
                <tbody>{rows}</tbody>
            </table>
            "#
        )
    }
}

/// `<datalist>` of known client names, for the free-text client fields.
struct ClientOptions<'a> {
    clients: &'a [Client],
}
impl Component for ClientOptions<'_> {
    fn render(&self) -> String {
        let options = self.clients.iter().fold(String::new(), |mut out, c| {
            let _ = write!(
                out,
                r#"<option value="{}"></option>"#,
                clean_text(&c.name)
            );
            out
        });
        format!(r#"<datalist id="client-names">{options}</datalist>"#)
    }
}

pub struct AppointmentsView<'a> {
    pub appointments: &'a [Appointment],
    pub clients: &'a [Client],
    pub today: NaiveDate,
}
impl Component for AppointmentsView<'_> {
    fn render(&self) -> String {
        let table = AppointmentTable {
            appointments: self.appointments,
        }
        .render();
        let client_options = ClientOptions {
            clients: self.clients,
        }
        .render();
        let statuses = [
            AppointmentStatus::Upcoming,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
        ]
        .iter()
        .map(|s| format!(r#"<option value="{0}">{0}</option>"#, s.as_str()))
        .collect::<Vec<String>>()
        .join("");
        format!(
            r##"
            <h1>Appointments</h1>
            <form hx-post="/appointments" hx-target="#app" hx-on::after-request="this.reset()">
                {client_options}
                <input name="client_name" list="client-names" placeholder="Client" required />
                <input name="kind" placeholder="Type (e.g. Loan Signing)" />
                <input name="date" type="date" value="{today}" />
                <input name="time" type="time" />
                <input name="amount" inputmode="decimal" placeholder="Fee" />
                <input name="location" placeholder="Location" />
                <select name="status">{statuses}</select>
                <button>Add appointment</button>
            </form>
            {table}
            "##,
            today = self.today.format("%Y-%m-%d"),
        )
    }
}

pub struct ClientsView<'a> {
    pub clients: &'a [Client],
}
impl Component for ClientsView<'_> {
    fn render(&self) -> String {
        let rows = self.clients.iter().fold(String::new(), |mut out, c| {
            let _ = write!(
                out,
                r#"
                <tr>
                    <td>{name}</td>
                    <td>{contact}</td>
                    <td>{email}</td>
                    <td>{phone}</td>
                    <td>{kind}</td>
                    <td>{status}</td>
                </tr>
                "#,
                name = clean(&c.name),
                contact = clean(&c.contact),
                email = clean(&c.email),
                phone = clean(&c.phone),
                kind = c.kind.label(),
                status = StatusBadge {
                    status: c.status.label()
                }
                .render(),
            );
            out
        });
        let modal = AddClientModal {}.render();
        format!(
            r#"
            <h1>Clients</h1>
            <button onclick="document.getElementById('add-client').showModal()">
                Add client
            </button>
            {modal}
            <table>
                <thead><tr>
                    <th>Name</th><th>Contact</th><th>Email</th>
                    <th>Phone</th><th>Type</th><th>Status</th>
                </tr></thead>
                <tbody>{rows}</tbody>
            </table>
            "#
        )
    }
}

pub struct AddClientModal {}
impl Component for AddClientModal {
    fn render(&self) -> String {
        let types = ClientType::ALL
            .iter()
            .map(|t| format!(r#"<option value="{0}">{0}</option>"#, t.label()))
            .collect::<Vec<String>>()
            .join("");
        format!(
            r##"
            <dialog id="add-client">
                <form hx-post="/clients" hx-target="#app">
                    <label for="client-name">Name</label>
                    <input id="client-name" name="name" required />
                    <label for="client-contact">Contact</label>
                    <input id="client-contact" name="contact" />
                    <label for="client-email">Email</label>
                    <input id="client-email" name="email" type="email" />
                    <label for="client-phone">Phone</label>
                    <input id="client-phone" name="phone" type="tel" />
                    <label for="client-kind">Type</label>
                    <select id="client-kind" name="kind">{types}</select>
                    <button>Save</button>
                    <button type="button" onclick="this.closest('dialog').close()">Cancel</button>
                </form>
            </dialog>
            "##
        )
    }
}

pub struct InvoicesView<'a> {
    pub invoices: &'a [Invoice],
    pub clients: &'a [Client],
    pub today: NaiveDate,
}
impl Component for InvoicesView<'_> {
    fn render(&self) -> String {
        let rows = self.invoices.iter().fold(String::new(), |mut out, i| {
            let _ = write!(
                out,
                r#"
                <tr>
                    <td>{id}</td>
                    <td>{client}</td>
                    <td>{amount}</td>
                    <td>{date}</td>
                    <td>{due}</td>
                    <td>{status}</td>
                </tr>
                "#,
                id = clean(&i.id),
                client = clean(&i.client),
                amount = format_money(i.amount),
                date = clean(&i.date),
                due = clean(&i.due_date),
                status = StatusBadge {
                    status: i.status.label()
                }
                .render(),
            );
            out
        });
        let statuses = InvoiceStatus::ALL
            .iter()
            .map(|s| format!(r#"<option value="{0}">{0}</option>"#, s.label()))
            .collect::<Vec<String>>()
            .join("");
        let client_options = ClientOptions {
            clients: self.clients,
        }
        .render();
        let due = self.today + chrono::Duration::days(30);
        format!(
            r##"
            <h1>Invoices</h1>
            <form hx-post="/invoices" hx-target="#app">
                <span>Next: {next}</span>
                {client_options}
                <input name="client" list="client-names" placeholder="Client" required />
                <input name="amount" inputmode="decimal" placeholder="Amount" required />
                <input name="date" type="date" value="{today}" />
                <input name="due_date" type="date" value="{due}" />
                <select name="status">{statuses}</select>
                <button>Create invoice</button>
            </form>
            <table>
                <thead><tr>
                    <th>Invoice</th><th>Client</th><th>Amount</th>
                    <th>Issued</th><th>Due</th><th>Status</th>
                </tr></thead>
                <tbody>{rows}</tbody>
            </table>
            "##,
            next = next_invoice_code(self.invoices),
            today = self.today.format("%Y-%m-%d"),
            due = due.format("%Y-%m-%d"),
        )
    }
}

pub struct MileageView<'a> {
    pub logs: &'a [MileageLog],
    pub settings: &'a Settings,
    pub today: NaiveDate,
}
impl Component for MileageView<'_> {
    fn render(&self) -> String {
        let rate = self.settings.cost_per_mile;
        let rows = self.logs.iter().fold(String::new(), |mut out, m| {
            let _ = write!(
                out,
                r#"
                <tr>
                    <td>{date}</td>
                    <td>{destination}</td>
                    <td>{purpose}</td>
                    <td>{miles:.1}</td>
                    <td>{deduction}</td>
                </tr>
                "#,
                date = clean(&m.date),
                destination = clean(&m.destination),
                purpose = clean(&m.purpose),
                miles = m.miles,
                deduction = format_money(m.miles * rate),
            );
            out
        });
        format!(
            r##"
            <h1>Mileage</h1>
            <p class="muted">Deductions at {rate} per mile.</p>
            <form hx-post="/mileage" hx-target="#app" hx-on::after-request="this.reset()">
                <input name="date" type="date" value="{today}" />
                <input name="destination" placeholder="Destination" required />
                <input name="purpose" placeholder="Purpose" />
                <input name="miles" inputmode="decimal" placeholder="Miles" required />
                <button>Log trip</button>
            </form>
            <table>
                <thead><tr>
                    <th>Date</th><th>Destination</th><th>Purpose</th>
                    <th>Miles</th><th>Deduction</th>
                </tr></thead>
                <tbody>{rows}</tbody>
            </table>
            "##,
            rate = format_money(rate),
            today = self.today.format("%Y-%m-%d"),
        )
    }
}

pub struct SettingsView<'a> {
    pub settings: &'a Settings,
}
impl Component for SettingsView<'_> {
    fn render(&self) -> String {
        let s = self.settings;
        format!(
            r##"
            <h1>Settings</h1>
            <form hx-post="/settings" hx-target="#app">
                <label for="owner_name">Your name</label>
                <input id="owner_name" name="owner_name" value="{owner}" />
                <label for="business_name">Business name</label>
                <input id="business_name" name="business_name" value="{business}" />
                <label for="cost_per_mile">Cost per mile</label>
                <input id="cost_per_mile" name="cost_per_mile" inputmode="decimal" value="{cost_per_mile}" />
                <label for="tax_rate">Tax rate (%)</label>
                <input id="tax_rate" name="tax_rate" inputmode="decimal" value="{tax_rate}" />
                <label for="monthly_goal">Monthly revenue goal</label>
                <input id="monthly_goal" name="monthly_goal" inputmode="decimal" value="{monthly_goal}" />
                <button>Save settings</button>
            </form>
            "##,
            owner = clean_text(&s.owner_name),
            business = clean_text(&s.business_name),
            cost_per_mile = s.cost_per_mile,
            tax_rate = s.tax_rate,
            monthly_goal = s.monthly_goal,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 20).expect("valid date")
    }

    struct Exploding {}
    impl Component for Exploding {
        fn render(&self) -> String {
            panic!("table rendering hit a bad row")
        }
    }

    #[test]
    fn test_render_guarded_contains_panics() {
        let html = render_guarded(&Exploding {});
        assert!(html.contains("Something went wrong"));
        assert!(html.contains("window.location.reload()"));
    }

    #[test]
    fn test_render_guarded_passes_through() {
        let html = render_guarded(&RecoveryNotice {});
        assert_eq!(html, RecoveryNotice {}.render());
    }

    #[test]
    fn test_user_text_is_sanitized() {
        let clients = vec![Client {
            name: "<script>alert(1)</script>Acme".to_string(),
            ..Client::new("x")
        }];
        let html = ClientsView { clients: &clients }.render();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("Acme"));
    }

    #[test]
    fn test_every_view_renders() {
        let doc = Document::default();
        let user = User {
            name: "Jack".to_string(),
            email: "jack@jack.com".to_string(),
        };
        for view in View::ALL {
            let html = ActiveView {
                view,
                user: Some(&user),
                doc: &doc,
                today: today(),
            }
            .render();
            assert!(html.contains(&format!(r#"data-view="{view}""#)));
        }
    }

    #[test]
    fn test_quotes_cannot_escape_attributes() {
        let name = r#"x" autofocus onfocus="alert(1)"#;
        let clients = vec![Client::new(name)];
        let html = ClientOptions { clients: &clients }.render();
        assert!(!html.contains(r#"x" autofocus"#));
        assert!(html.contains("&quot;"));

        let settings = Settings {
            owner_name: name.to_string(),
            business_name: name.to_string(),
            ..Settings::default()
        };
        let html = SettingsView {
            settings: &settings,
        }
        .render();
        assert!(!html.contains(r#"x" autofocus"#));

        let html = StatusBadge {
            status: r#"late" onclick="alert(1)"#,
        }
        .render();
        assert!(html.contains(r#"class="badge badge-late-onclickalert1""#));
    }

    #[test]
    fn test_nav_depends_on_user() {
        let signed_out = Nav {
            active: View::Landing,
            user: None,
        }
        .render();
        assert!(signed_out.contains("Sign in"));
        assert!(!signed_out.contains("Invoices"));

        let user = User {
            name: "Jack".to_string(),
            email: "jack@jack.com".to_string(),
        };
        let signed_in = Nav {
            active: View::Invoices,
            user: Some(&user),
        }
        .render();
        assert!(signed_in.contains("Sign out"));
        assert!(signed_in.contains(r#""to": "invoices""#));
    }

    #[test]
    fn test_outbox_script() {
        let html = Outbox {
            fragment: Some("#/auth"),
        }
        .render();
        assert!(html.contains(r##"window.location.hash = "#/auth""##));

        let html = Outbox {
            fragment: Some(r#"#/x";alert(1)//"#),
        }
        .render();
        assert!(!html.contains("alert(1)\""));
        assert!(!html.contains(";alert"));

        let html = Outbox { fragment: None }.render();
        assert!(html.contains("reportFragment()"));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(0.0), "$0.00");
        assert_eq!(format_money(75.0), "$75.00");
        assert_eq!(format_money(1234.5), "$1,234.50");
        assert_eq!(format_money(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_money(-12.5), "-$12.50");
    }

    #[test]
    fn test_dashboard_shows_owner_and_goal() {
        let doc = Document::default();
        let html = Dashboard {
            doc: &doc,
            today: today(),
        }
        .render();
        assert!(html.contains("Jordan Ellis"));
        assert!(html.contains("$15,000.00"));
    }
}
