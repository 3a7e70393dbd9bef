//! Provisions an account: `seed-candidate <name> <email> <password> [candidate|hr]`.

use std::sync::Arc;

use anyhow::bail;
use interview_backend::{
    config::{get_env, get_env_parse_or},
    database::{pool, PgStore},
    models::candidate::Role,
    services::candidate_service::CandidateService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("interview_backend=info").init();
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (name, email, password) = match args.as_slice() {
        [name, email, password, ..] => (name, email, password),
        _ => bail!("usage: seed-candidate <name> <email> <password> [candidate|hr]"),
    };
    let role = match args.get(3) {
        Some(raw) => raw.parse::<Role>()?,
        None => Role::Candidate,
    };

    // same keys as the server, without requiring the adapter settings
    let database_url = get_env("DATABASE_URL")?;
    let jwt_secret = get_env("JWT_SECRET")?;
    let jwt_ttl_hours = get_env_parse_or("JWT_TTL_HOURS", 24)?;

    let pool = pool::create_pool(&database_url).await?;
    pool::run_migrations(&pool).await?;

    let service = CandidateService::new(Arc::new(PgStore::new(pool)), jwt_secret, jwt_ttl_hours);
    let candidate = service.register(name, email, password, role).await?;
    println!("{} {} ({})", candidate.id, candidate.email, role.as_str());
    Ok(())
}
