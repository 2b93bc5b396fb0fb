use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password, Select};
use dotenvy::dotenv;
use validator::Validate;

use classconnect_cli::seeder::{self, SeedConfig};
use classconnect_config::{AppConfig, DatabaseConfig};
use classconnect_core::PasswordHasher;
use classconnect_db::{PgStore, Store, StoreError, init_db_pool, migrate};
use classconnect_models::UserRole;
use classconnect_models::auth::RegisterRequest;
use classconnect_models::users::NewUser;

#[derive(Parser)]
#[command(name = "classconnect-cli")]
#[command(about = "ClassConnect CLI - Administrative tools for ClassConnect", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create a teacher or student account
    CreateUser {
        /// First name
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name
        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,

        /// Account role: teacher or student
        #[arg(short = 'r', long)]
        role: Option<UserRole>,

        /// Department, for teachers
        #[arg(long)]
        department: Option<String>,

        /// Grade level, for students
        #[arg(long)]
        grade_level: Option<String>,
    },
    /// Seed the database with fake teachers, students, classes and assignments
    Seed {
        /// Number of teachers to create
        #[arg(short = 't', long, default_value = "3")]
        teachers: usize,

        /// Number of classes per teacher
        #[arg(short = 'c', long, default_value = "2")]
        classes: usize,

        /// Number of students, each enrolled in every seeded class
        #[arg(short = 's', long, default_value = "30")]
        students: usize,

        /// Number of assignments per class
        #[arg(short = 'a', long, default_value = "4")]
        assignments: usize,
    },
    /// Remove every seeded account and the classes they created
    ClearSeed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let db_config = DatabaseConfig::from_env().context("invalid database config")?;
    let pool = init_db_pool(&db_config)
        .await
        .context("failed to connect to Postgres (is DATABASE_URL set?)")?;

    if let Commands::Migrate = cli.command {
        migrate(&pool).await.context("failed to run migrations")?;
        println!("✅ Migrations applied");
        return Ok(());
    }

    let app_config = AppConfig::from_env().context("invalid application config")?;
    let hasher = PasswordHasher::new(app_config.bcrypt_cost);
    let store = PgStore::new(pool);

    match cli.command {
        Commands::Migrate => Ok(()),
        Commands::CreateUser {
            first_name,
            last_name,
            email,
            password,
            role,
            department,
            grade_level,
        } => {
            let request = prompt_missing(
                first_name,
                last_name,
                email,
                password,
                role,
                department,
                grade_level,
            )?;
            handle_create_user(&store, &hasher, request).await
        }
        Commands::Seed {
            teachers,
            classes,
            students,
            assignments,
        } => {
            let config = SeedConfig {
                teachers,
                classes_per_teacher: classes,
                students,
                assignments_per_class: assignments,
            };
            seeder::seed_all(&store, &hasher, config, Utc::now()).await?;
            Ok(())
        }
        Commands::ClearSeed => {
            seeder::clear_seed(&store).await?;
            Ok(())
        }
    }
}

fn prompt_missing(
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    role: Option<UserRole>,
    department: Option<String>,
    grade_level: Option<String>,
) -> anyhow::Result<RegisterRequest> {
    let first_name = match first_name {
        Some(value) => value,
        None => Input::new().with_prompt("First name").interact_text()?,
    };

    let last_name = match last_name {
        Some(value) => value,
        None => Input::new().with_prompt("Last name").interact_text()?,
    };

    let email = match email {
        Some(value) => value,
        None => Input::new().with_prompt("Email address").interact_text()?,
    };

    let password = match password {
        Some(value) => value,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    let role = match role {
        Some(role) => role,
        None => {
            let choices = [UserRole::Teacher, UserRole::Student];
            let labels: Vec<&str> = choices.iter().map(|r| r.as_str()).collect();
            let picked = Select::new()
                .with_prompt("Role")
                .items(&labels)
                .default(0)
                .interact()?;
            choices[picked]
        }
    };

    let (department, grade_level) = match role {
        UserRole::Teacher => (department.or_else(|| optional_input("Department")), None),
        UserRole::Student => (None, grade_level.or_else(|| optional_input("Grade level"))),
    };

    Ok(RegisterRequest {
        email,
        password,
        first_name,
        last_name,
        role,
        department,
        grade_level,
    })
}

fn optional_input(prompt: &str) -> Option<String> {
    Input::<String>::new()
        .with_prompt(format!("{prompt} (optional)"))
        .allow_empty(true)
        .interact_text()
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

async fn handle_create_user(
    db: &dyn Store,
    hasher: &PasswordHasher,
    request: RegisterRequest,
) -> anyhow::Result<()> {
    if let Err(errors) = request.validate() {
        bail!("invalid account details: {errors}");
    }

    let email = request.email.trim().to_lowercase();
    let password_hash = hasher.hash(&request.password)?;
    let role = request.role;

    let user = db
        .create_user(NewUser {
            email,
            password_hash,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            role,
            department: request.department,
            grade_level: request.grade_level,
            registered_at: Utc::now(),
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => anyhow::anyhow!("an account with that email already exists"),
            other => anyhow::Error::new(other),
        })?;

    println!("\n✅ {} account created successfully!", role.as_str());
    println!("   Email: {}", user.email);
    println!("   Name: {} {}", user.first_name, user.last_name);
    Ok(())
}
