//! Application and site configuration
//!
//! Every API call is scoped to a cloud application identified by an app ID
//! and app key, hosted on one of the regional sites.

use crate::error::{Result, ThingIfError};
use serde::{Deserialize, Serialize};
use url::Url;

/// Regional cloud site hosting the application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    /// United States (api.kii.com)
    Us,
    /// Japan (api-jp.kii.com)
    Jp,
    /// Europe (api-eu.kii.com)
    Eu,
    /// China (api-cn3.kii.cn)
    Cn3,
    /// Singapore (api-sg.kii.com)
    Sg,
    /// Self-hosted or test deployment with an explicit base URL
    Custom(Url),
}

impl Site {
    /// Base URL of the site's API host
    pub fn base_url(&self) -> Result<Url> {
        let url = match self {
            Site::Us => "https://api.kii.com",
            Site::Jp => "https://api-jp.kii.com",
            Site::Eu => "https://api-eu.kii.com",
            Site::Cn3 => "https://api-cn3.kii.cn",
            Site::Sg => "https://api-sg.kii.com",
            Site::Custom(url) => return Ok(url.clone()),
        };
        Url::parse(url).map_err(|e| ThingIfError::config(format!("Invalid site URL: {e}")))
    }
}

/// Application credentials and site binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KiiApp {
    /// Application ID
    pub app_id: String,

    /// Application key sent with every request
    pub app_key: String,

    /// Hosting site
    pub site: Site,
}

impl KiiApp {
    /// Create a new application descriptor
    pub fn new<S: Into<String>>(app_id: S, app_key: S, site: Site) -> Result<Self> {
        let app_id = app_id.into();
        let app_key = app_key.into();
        if app_id.is_empty() {
            return Err(ThingIfError::config("app_id is empty"));
        }
        if app_key.is_empty() {
            return Err(ThingIfError::config("app_key is empty"));
        }
        Ok(Self {
            app_id,
            app_key,
            site,
        })
    }

    /// Base URL of the thing-if API for this application:
    /// `{site}/thing-if/apps/{app_id}`
    pub fn thing_if_base_url(&self) -> Result<Url> {
        let base = self.site.base_url()?;
        base.join(&format!("thing-if/apps/{}/", self.app_id))
            .map_err(|e| ThingIfError::config(format!("Invalid thing-if base URL: {e}")))
    }
}
