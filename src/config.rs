use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_url: String,
    pub api_token: Option<String>, // unset means no mail provider; codes are logged
    pub from: String,
    pub app_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "svift".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "svift-users".into()),
        };
        let mail = MailConfig {
            api_url: std::env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://api.postmarkapp.com".into()),
            api_token: std::env::var("MAIL_API_TOKEN").ok(),
            from: std::env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@svift.com".into()),
            app_name: std::env::var("APP_NAME").unwrap_or_else(|_| "Svift".into()),
        };
        Ok(Self {
            database_url,
            jwt,
            mail,
        })
    }
}
