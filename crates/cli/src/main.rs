use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use clinica_core::{
    constants::{DEFAULT_API_URL, DEFAULT_CLINIC_DATA_DIR},
    models::{MedicalRecord, NewTemplate, TemplateId},
    primary_save_mode_from_env_value, AttendanceEditor, AttendanceGateway, AttendanceService,
    CoreConfig, EditorContext, FormsService, HttpClinicClient, LocalClinic, NewAppointment,
    NonEmptyText, Role, Session, SessionStore, User,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SESSION_FILE: &str = ".clinica/session.json";

#[derive(Parser)]
#[command(name = "clinica")]
#[command(about = "Clinic attendance records CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the local setup
    Health,
    /// List active templates in catalog order
    ListTemplates,
    /// Import a template from a JSON file
    ImportTemplate {
        /// Path to a JSON file with title, type, specialties and schema_config
        file: PathBuf,
    },
    /// Delete a template
    DeleteTemplate {
        /// Template id
        id: String,
    },
    /// Register a patient
    AddPatient {
        /// Patient name
        name: String,
    },
    /// List all patients
    ListPatients,
    /// Schedule an appointment
    Schedule {
        /// Patient id
        patient_id: String,
        /// Volunteer user id
        volunteer_id: String,
        /// Date (YYYY-MM-DD)
        date: String,
        /// Time (HH:MM)
        time: String,
    },
    /// Fill documents on an appointment's record and save it as its volunteer
    ///
    /// The save honours CLINICA_PRIMARY_SAVE: `replace` (default) writes only the documents,
    /// dropping other record sections such as a meal plan; `merge` keeps them.
    Attend {
        /// Appointment id
        appointment_id: String,
        /// Volunteer user id the appointment belongs to
        #[arg(long)]
        volunteer: String,
        /// Document to fill, as TEMPLATE_ID=JSON (repeatable)
        #[arg(long = "doc")]
        docs: Vec<String>,
        /// Chief complaint (kept from the record if omitted)
        #[arg(long)]
        chief_complaint: Option<String>,
        /// History (kept from the record if omitted)
        #[arg(long)]
        history: Option<String>,
    },
    /// Print the record of an appointment
    ShowRecord {
        /// Appointment id
        appointment_id: String,
    },
    /// Print a patient's records, newest first
    History {
        /// Patient id
        patient_id: String,
    },
    /// Store a session for remote commands
    Login {
        /// API key issued for this deployment
        token: String,
        /// User id
        user_id: String,
        /// Display name
        name: String,
        /// VOLUNTEER, ADMIN or STAFF
        role: String,
        /// Free-text specialty (optional)
        #[arg(long)]
        specialty: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the stored session's user
    Whoami,
    /// Fetch the logged-in volunteer's queue from the REST API
    Queue {
        /// API base URL (defaults to CLINICA_API_URL or http://localhost:3000)
        #[arg(long)]
        api_url: Option<String>,
    },
}

fn core_config() -> anyhow::Result<Arc<CoreConfig>> {
    let dir = std::env::var("CLINIC_DATA_DIR").unwrap_or_else(|_| DEFAULT_CLINIC_DATA_DIR.into());
    let primary_save_mode =
        primary_save_mode_from_env_value(std::env::var("CLINICA_PRIMARY_SAVE").ok())?;
    Ok(Arc::new(CoreConfig::new(PathBuf::from(dir), primary_save_mode)?))
}

/// Splits a `TEMPLATE_ID=JSON` argument.
fn parse_doc(raw: &str) -> anyhow::Result<(TemplateId, Value)> {
    let (id, json) = raw
        .split_once('=')
        .with_context(|| format!("'{raw}' is not TEMPLATE_ID=JSON"))?;
    let value = serde_json::from_str(json)
        .with_context(|| format!("document for '{id}' is not valid JSON"))?;
    Ok((TemplateId::from(id.trim()), value))
}

struct AttendRequest {
    docs: Vec<(TemplateId, Value)>,
    chief_complaint: Option<String>,
    history: Option<String>,
}

/// Runs an attendance editor session in-process and saves it.
async fn attend(
    cfg: Arc<CoreConfig>,
    appointment_id: &str,
    volunteer: User,
    request: AttendRequest,
) -> anyhow::Result<MedicalRecord> {
    let clinic = Arc::new(LocalClinic::new(cfg.clone(), volunteer.clone()));
    let session = Arc::new(Session {
        token: String::new(),
        user: volunteer,
    });
    let ctx = EditorContext::new(cfg, session, clinic.clone(), clinic);
    let mut editor = AttendanceEditor::open(ctx, appointment_id).await?;

    let missing: Vec<TemplateId> = request
        .docs
        .iter()
        .map(|(id, _)| id)
        .filter(|id| !editor.selected().iter().any(|t| &t.id == *id))
        .cloned()
        .collect();
    if !missing.is_empty() {
        editor.open_picker().await;
        for id in &missing {
            editor.toggle_template(id);
        }
        if !editor.confirm_picker() {
            anyhow::bail!("template catalog could not be loaded");
        }
    }

    for (id, value) in request.docs {
        editor.set_document_value(&id, value)?;
    }
    if let Some(chief_complaint) = request.chief_complaint {
        editor.base_form_mut().chief_complaint = chief_complaint;
    }
    if let Some(history) = request.history {
        editor.base_form_mut().history = history;
    }

    Ok(editor.save().await?)
}

fn session_store() -> SessionStore {
    let path =
        std::env::var("CLINICA_SESSION_FILE").unwrap_or_else(|_| DEFAULT_SESSION_FILE.into());
    SessionStore::new(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinica=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Health) => {
            let health = api_shared::HealthService::check_health();
            println!("{}", health.message);
            let cfg = core_config()?;
            println!("Data directory: {}", cfg.clinic_data_dir().display());
        }
        Some(Commands::ListTemplates) => {
            let forms = FormsService::new(core_config()?);
            let templates = forms.list_templates();
            if templates.is_empty() {
                println!("No templates found.");
            } else {
                for template in templates {
                    println!(
                        "ID: {}, Title: {}, Specialties: [{}]",
                        template.id,
                        template.title,
                        template.specialties.join(", ")
                    );
                }
            }
        }
        Some(Commands::ImportTemplate { file }) => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let new: NewTemplate = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a template", file.display()))?;
            match FormsService::new(core_config()?).create_template(new) {
                Ok(template) => println!("Imported template with ID: {}", template.id),
                Err(e) => eprintln!("Error importing template: {}", e),
            }
        }
        Some(Commands::DeleteTemplate { id }) => {
            match FormsService::new(core_config()?).delete_template(&id) {
                Ok(()) => println!("Deleted template: {}", id),
                Err(e) => eprintln!("Error deleting template: {}", e),
            }
        }
        Some(Commands::AddPatient { name }) => {
            let name = NonEmptyText::new(&name)?;
            match AttendanceService::new(core_config()?).register_patient(name) {
                Ok(patient) => println!("Registered patient with ID: {}", patient.id),
                Err(e) => eprintln!("Error registering patient: {}", e),
            }
        }
        Some(Commands::ListPatients) => {
            let patients = AttendanceService::new(core_config()?).list_patients();
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in patients {
                    println!("ID: {}, Name: {}", patient.id, patient.name);
                }
            }
        }
        Some(Commands::Schedule {
            patient_id,
            volunteer_id,
            date,
            time,
        }) => {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{date}', expected YYYY-MM-DD"))?;
            let new = NewAppointment {
                patient_id,
                volunteer_id,
                date,
                time,
            };
            match AttendanceService::new(core_config()?).schedule(new) {
                Ok(appointment) => println!("Scheduled appointment with ID: {}", appointment.id),
                Err(e) => eprintln!("Error scheduling appointment: {}", e),
            }
        }
        Some(Commands::Attend {
            appointment_id,
            volunteer,
            docs,
            chief_complaint,
            history,
        }) => {
            let docs = docs
                .iter()
                .map(|raw| parse_doc(raw))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let user = User {
                id: volunteer.clone(),
                name: volunteer,
                role: Role::Volunteer,
                specialty: None,
            };
            let request = AttendRequest {
                docs,
                chief_complaint,
                history,
            };
            match attend(core_config()?, &appointment_id, user, request).await {
                Ok(record) => println!(
                    "Saved record {} for appointment {}",
                    record.id, record.appointment_id
                ),
                Err(e) => eprintln!("Error saving attendance: {:#}", e),
            }
        }
        Some(Commands::ShowRecord { appointment_id }) => {
            match AttendanceService::new(core_config()?).get_record(&appointment_id) {
                Ok(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                Err(e) => eprintln!("Error reading record: {}", e),
            }
        }
        Some(Commands::History { patient_id }) => {
            match AttendanceService::new(core_config()?).patient_history(&patient_id) {
                Ok(records) if records.is_empty() => println!("No records found."),
                Ok(records) => {
                    for record in records {
                        println!(
                            "{} | appointment {} | volunteer {} | {}",
                            record.created_at.format("%Y-%m-%d %H:%M"),
                            record.appointment_id,
                            record.volunteer_id,
                            record.chief_complaint
                        );
                    }
                }
                Err(e) => eprintln!("Error reading history: {}", e),
            }
        }
        Some(Commands::Login {
            token,
            user_id,
            name,
            role,
            specialty,
        }) => {
            let role: Role = role.parse()?;
            let session = Session {
                token,
                user: User {
                    id: user_id,
                    name,
                    role,
                    specialty,
                },
            };
            let store = session_store();
            store.save(&session)?;
            println!(
                "Logged in as {} ({}); session stored at {}",
                session.user.name,
                session.user.role,
                store.path().display()
            );
        }
        Some(Commands::Logout) => {
            session_store().clear()?;
            println!("Logged out.");
        }
        Some(Commands::Whoami) => match session_store().load()? {
            Some(session) => {
                let user = session.user;
                println!("ID: {}, Name: {}, Role: {}", user.id, user.name, user.role);
                if let Some(specialty) = user.specialty {
                    println!("Specialty: {}", specialty);
                }
            }
            None => println!("Not logged in."),
        },
        Some(Commands::Queue { api_url }) => {
            let session = session_store()
                .load()?
                .context("not logged in; run `clinica login` first")?;
            let api_url = api_url
                .or_else(|| std::env::var("CLINICA_API_URL").ok())
                .unwrap_or_else(|| DEFAULT_API_URL.into());
            let client = HttpClinicClient::new(api_url, Arc::new(session))?;
            match client.my_appointments().await {
                Ok(queue) if queue.is_empty() => println!("No appointments."),
                Ok(queue) => {
                    for entry in queue {
                        let appointment = entry.appointment;
                        println!(
                            "{} {} | {} | {} | ID: {}",
                            appointment.date,
                            appointment.time,
                            entry.patient_name,
                            appointment.status,
                            appointment.id
                        );
                    }
                }
                Err(e) => eprintln!("Error fetching queue: {}", e),
            }
        }
        None => {
            println!("Use 'clinica --help' for commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clinica_core::models::{ContentEnvelope, FilledForms, RecordPayload, TemplateKind};
    use clinica_core::PrimarySaveMode;
    use serde_json::json;
    use tempfile::TempDir;

    fn volunteer() -> User {
        User {
            id: "vol-1".into(),
            name: "vol-1".into(),
            role: Role::Volunteer,
            specialty: None,
        }
    }

    /// A finished appointment whose record carries a sibling `vitals` section.
    fn seeded(dir: &TempDir, mode: PrimarySaveMode) -> (Arc<CoreConfig>, TemplateId, String) {
        let cfg = Arc::new(CoreConfig::new(dir.path().to_path_buf(), mode).unwrap());
        let template = FormsService::new(cfg.clone())
            .create_template(NewTemplate {
                title: NonEmptyText::new("Anamnese").unwrap(),
                description: None,
                kind: TemplateKind::Dynamic,
                specialties: vec![],
                schema_config: json!({}),
            })
            .unwrap();
        let attendance = AttendanceService::new(cfg.clone());
        let patient = attendance
            .register_patient(NonEmptyText::new("Carla").unwrap())
            .unwrap();
        let appointment = attendance
            .schedule(NewAppointment {
                patient_id: patient.id,
                volunteer_id: "vol-1".into(),
                date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
                time: "09:00".into(),
            })
            .unwrap();
        let content: ContentEnvelope =
            serde_json::from_value(json!({"vitals": {"pa": "12x8"}})).unwrap();
        attendance
            .finish(
                &volunteer(),
                &appointment.id,
                RecordPayload {
                    chief_complaint: "cefaleia".into(),
                    history: "3 dias".into(),
                    procedures: None,
                    prescription: None,
                    content,
                },
            )
            .unwrap();
        (cfg, template.id, appointment.id)
    }

    fn request(id: &TemplateId) -> AttendRequest {
        AttendRequest {
            docs: vec![parse_doc(&format!("{id}={{\"queixa\": \"dor\"}}")).unwrap()],
            chief_complaint: None,
            history: Some("5 dias".into()),
        }
    }

    #[test]
    fn test_parse_doc() {
        let (id, value) = parse_doc("abc={\"kcal\": 1800}").unwrap();
        assert_eq!(id, TemplateId::from("abc"));
        assert_eq!(value, json!({"kcal": 1800}));
        assert!(parse_doc("abc").is_err());
        assert!(parse_doc("abc={").is_err());
    }

    #[tokio::test]
    async fn test_attend_in_merge_mode_keeps_other_sections() {
        let dir = TempDir::new().unwrap();
        let (cfg, template_id, appointment_id) = seeded(&dir, PrimarySaveMode::MergeSlices);

        let record = attend(cfg, &appointment_id, volunteer(), request(&template_id))
            .await
            .unwrap();

        assert_eq!(record.chief_complaint, "cefaleia");
        assert_eq!(record.history, "5 dias");
        assert_eq!(record.content.raw("vitals"), Some(&json!({"pa": "12x8"})));
        let forms = record.content.slice::<FilledForms>().unwrap().unwrap();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms.iter().next().unwrap().data, json!({"queixa": "dor"}));
    }

    #[tokio::test]
    async fn test_attend_in_replace_mode_drops_other_sections() {
        let dir = TempDir::new().unwrap();
        let (cfg, template_id, appointment_id) = seeded(&dir, PrimarySaveMode::ReplaceContent);

        let record = attend(cfg, &appointment_id, volunteer(), request(&template_id))
            .await
            .unwrap();

        assert!(record.content.raw("vitals").is_none());
        assert!(record.content.contains("filled_forms"));
    }
}
