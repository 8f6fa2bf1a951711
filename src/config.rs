//! Environment-derived configuration.
//!
//! Everything is collected once at startup and passed down explicitly; no
//! module reads the environment after boot.

use anyhow::{Context, Result};
use rust_decimal::Decimal;

use crate::pricing::PricingPolicy;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub pricing: PricingPolicy,
    pub nats_url: Option<String>,
    pub whatsapp: Option<WhatsAppConfig>,
}

#[derive(Clone, Debug)]
pub struct WhatsAppConfig {
    pub api_url: String,
    pub phone_number_id: String,
    pub access_token: String,
    pub verify_token: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8083".to_string())
            .parse()
            .context("PORT must be a number")?;

        let pricing = PricingPolicy {
            vat_percent: env_decimal("VAT_PERCENTAGE", "6")?,
            shipping_cost: env_decimal("SHIPPING_COST", "0")?,
            free_shipping_above: env_decimal("FREE_SHIPPING_ABOVE", "200")?,
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "GHS".to_string()),
        };

        let whatsapp = match (
            std::env::var("WHATSAPP_PHONE_NUMBER_ID"),
            std::env::var("WHATSAPP_ACCESS_TOKEN"),
        ) {
            (Ok(phone_number_id), Ok(access_token)) => Some(WhatsAppConfig {
                api_url: std::env::var("WHATSAPP_API_URL")
                    .unwrap_or_else(|_| "https://graph.facebook.com/v18.0".to_string()),
                phone_number_id,
                access_token,
                verify_token: std::env::var("WHATSAPP_VERIFY_TOKEN").unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            port,
            pricing,
            nats_url: std::env::var("NATS_URL").ok(),
            whatsapp,
        })
    }
}

fn env_decimal(key: &str, default: &str) -> Result<Decimal> {
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{key} must be a decimal number"))
}
