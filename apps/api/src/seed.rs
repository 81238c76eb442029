use anyhow::{Context, Result};
use tracing::{info, warn};

use auth_cell::models::normalize_email;
use auth_cell::AccountService;
use doctor_cell::{CatalogService, DoctorService, UpsertDoctorRequest};
use shared_config::AppConfig;
use shared_models::auth::UserRole;

const SERVICES: [&str; 5] = ["Dentistry", "Cardiology", "Dermatology", "Orthopedics", "Pediatrics"];

struct SeedDoctor {
    full_name: &'static str,
    title: &'static str,
    clinic_name: &'static str,
    fee: f64,
    rating: f64,
    service: &'static str,
}

const DOCTORS: [SeedDoctor; 3] = [
    SeedDoctor {
        full_name: "Dr. Lina Ahmad",
        title: "Senior Dentist",
        clinic_name: "Smile Clinic",
        fee: 25.0,
        rating: 4.7,
        service: "Dentistry",
    },
    SeedDoctor {
        full_name: "Dr. Omar Saleh",
        title: "Consultant Cardiologist",
        clinic_name: "HeartCare Center",
        fee: 40.0,
        rating: 4.5,
        service: "Cardiology",
    },
    SeedDoctor {
        full_name: "Dr. Rania Khaled",
        title: "Dermatologist",
        clinic_name: "DermaPlus",
        fee: 30.0,
        rating: 4.8,
        service: "Dermatology",
    },
];

pub async fn run(config: &AppConfig) -> Result<()> {
    seed_admin(config).await?;
    seed_catalog(config).await?;
    Ok(())
}

async fn seed_admin(config: &AppConfig) -> Result<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };

    let accounts = AccountService::new(config);
    if accounts.admin_exists().await.context("checking for an admin")? {
        return Ok(());
    }

    let email = normalize_email(email);
    if accounts.find_by_email(&email).await.context("looking up admin email")?.is_some() {
        warn!("ADMIN_EMAIL {} belongs to an existing non-admin user, not seeding", email);
        return Ok(());
    }

    let admin = accounts
        .create_user("System Admin", &email, password, UserRole::Admin)
        .await
        .context("creating admin user")?;
    info!("Seeded admin user {}", admin.id);
    Ok(())
}

async fn seed_catalog(config: &AppConfig) -> Result<()> {
    let catalog = CatalogService::new(config);
    if !catalog.list_services().await.context("listing services")?.is_empty() {
        return Ok(());
    }

    let mut service_ids = Vec::with_capacity(SERVICES.len());
    for name in SERVICES {
        let service = catalog
            .create_service(name)
            .await
            .with_context(|| format!("creating service {}", name))?;
        service_ids.push((name, service.id));
    }

    let doctors = DoctorService::new(config);
    for seed in &DOCTORS {
        let service_id = service_ids
            .iter()
            .find(|(name, _)| *name == seed.service)
            .map(|(_, id)| *id)
            .with_context(|| format!("no seeded service named {}", seed.service))?;

        doctors
            .create_doctor(&UpsertDoctorRequest {
                full_name: seed.full_name.to_string(),
                title: Some(seed.title.to_string()),
                bio: None,
                image_url: None,
                clinic_name: Some(seed.clinic_name.to_string()),
                fee: seed.fee,
                rating: Some(seed.rating),
                service_id,
                is_active: true,
            })
            .await
            .with_context(|| format!("creating doctor {}", seed.full_name))?;
    }

    info!("Seeded {} services and {} doctors", SERVICES.len(), DOCTORS.len());
    Ok(())
}
