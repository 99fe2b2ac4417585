//! Onboarding operations
//!
//! Onboarding registers a thing with the cloud on behalf of the owner and
//! establishes it as the API's target for subsequent commands, triggers and
//! state queries.

use super::ThingIfApi;
use crate::error::{Result, ThingIfError};
use crate::target::{Target, TypedId};
use crate::transport::{HttpRequest, Method};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

/// Media type for onboarding by vendor thing ID
pub const ONBOARD_BY_VENDOR_THING_ID_MEDIA_TYPE: &str =
    "application/vnd.kii.OnboardingWithVendorThingIDByOwner+json";

/// Media type for onboarding by cloud-assigned thing ID
pub const ONBOARD_BY_THING_ID_MEDIA_TYPE: &str =
    "application/vnd.kii.OnboardingWithThingIDByOwner+json";

/// Physical position of a thing in a gateway topology
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LayoutPosition {
    Gateway,
    Standalone,
    Endnode,
}

/// Onboard a thing identified by the vendor-assigned ID
#[derive(Debug, Clone)]
pub struct OnboardWithVendorThingIdRequest {
    /// Vendor-assigned thing identifier
    pub vendor_thing_id: String,
    /// Thing password set at provisioning time
    pub thing_password: String,
    /// Vendor-defined thing type
    pub thing_type: Option<String>,
    /// Initial firmware version
    pub firmware_version: Option<String>,
    /// Arbitrary thing properties stored at registration
    pub thing_properties: Option<Map<String, Value>>,
    /// Topology position
    pub layout_position: Option<LayoutPosition>,
}

impl OnboardWithVendorThingIdRequest {
    /// Create an onboarding request
    pub fn new<S: Into<String>>(vendor_thing_id: S, thing_password: S) -> Self {
        Self {
            vendor_thing_id: vendor_thing_id.into(),
            thing_password: thing_password.into(),
            thing_type: None,
            firmware_version: None,
            thing_properties: None,
            layout_position: None,
        }
    }

    /// Set the vendor-defined thing type
    pub fn thing_type<S: Into<String>>(mut self, thing_type: S) -> Self {
        self.thing_type = Some(thing_type.into());
        self
    }

    /// Set the initial firmware version
    pub fn firmware_version<S: Into<String>>(mut self, version: S) -> Self {
        self.firmware_version = Some(version.into());
        self
    }

    /// Set registration-time thing properties
    pub fn thing_properties(mut self, properties: Map<String, Value>) -> Self {
        self.thing_properties = Some(properties);
        self
    }

    /// Set the topology position
    pub fn layout_position(mut self, position: LayoutPosition) -> Self {
        self.layout_position = Some(position);
        self
    }
}

/// Onboard a thing already known by its cloud-assigned ID
#[derive(Debug, Clone)]
pub struct OnboardWithThingIdRequest {
    /// Cloud-assigned thing identifier
    pub thing_id: String,
    /// Thing password set at provisioning time
    pub thing_password: String,
    /// Topology position
    pub layout_position: Option<LayoutPosition>,
}

impl OnboardWithThingIdRequest {
    /// Create an onboarding request
    pub fn new<S: Into<String>>(thing_id: S, thing_password: S) -> Self {
        Self {
            thing_id: thing_id.into(),
            thing_password: thing_password.into(),
            layout_position: None,
        }
    }

    /// Set the topology position
    pub fn layout_position(mut self, position: LayoutPosition) -> Self {
        self.layout_position = Some(position);
        self
    }
}

/// Successful onboarding result
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct OnboardResult {
    /// Cloud-assigned thing ID
    #[serde(rename = "thingID")]
    pub thing_id: String,
    /// Access token scoped to the onboarded thing
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

impl ThingIfApi {
    /// Onboard a thing by its vendor-assigned ID and establish it as the
    /// API's target.
    pub async fn onboard_with_vendor_thing_id(
        &mut self,
        request: &OnboardWithVendorThingIdRequest,
    ) -> Result<OnboardResult> {
        if request.vendor_thing_id.is_empty() {
            return Err(ThingIfError::argument("vendorThingID is empty"));
        }
        if request.thing_password.is_empty() {
            return Err(ThingIfError::argument("thingPassword is empty"));
        }

        let mut body = Map::new();
        body.insert("vendorThingID".into(), json!(request.vendor_thing_id));
        body.insert("thingPassword".into(), json!(request.thing_password));
        body.insert("owner".into(), json!(self.owner().to_string()));
        if let Some(thing_type) = &request.thing_type {
            body.insert("thingType".into(), json!(thing_type));
        }
        if let Some(version) = &request.firmware_version {
            body.insert("firmwareVersion".into(), json!(version));
        }
        if let Some(properties) = &request.thing_properties {
            body.insert("thingProperties".into(), Value::Object(properties.clone()));
        }
        if let Some(position) = &request.layout_position {
            body.insert("layoutPosition".into(), json!(position));
        }

        self.onboard(ONBOARD_BY_VENDOR_THING_ID_MEDIA_TYPE, Value::Object(body))
            .await
    }

    /// Onboard a thing by its cloud-assigned ID and establish it as the
    /// API's target.
    pub async fn onboard_with_thing_id(
        &mut self,
        request: &OnboardWithThingIdRequest,
    ) -> Result<OnboardResult> {
        if request.thing_id.is_empty() {
            return Err(ThingIfError::argument("thingID is empty"));
        }
        if request.thing_password.is_empty() {
            return Err(ThingIfError::argument("thingPassword is empty"));
        }

        let mut body = Map::new();
        body.insert("thingID".into(), json!(request.thing_id));
        body.insert("thingPassword".into(), json!(request.thing_password));
        body.insert("owner".into(), json!(self.owner().to_string()));
        if let Some(position) = &request.layout_position {
            body.insert("layoutPosition".into(), json!(position));
        }

        self.onboard(ONBOARD_BY_THING_ID_MEDIA_TYPE, Value::Object(body))
            .await
    }

    async fn onboard(&mut self, media_type: &str, body: Value) -> Result<OnboardResult> {
        let url = self.endpoint("onboardings")?;
        let request = HttpRequest::new(Method::Post, url)
            .header("Content-Type", media_type)
            .json(body);
        let response = self.dispatch(request).await?;

        let result: OnboardResult = serde_json::from_value(response)?;
        debug!("Onboarded thing {}", result.thing_id);

        let target = Target::new(TypedId::thing(&result.thing_id)?)
            .with_access_token(&result.access_token);
        self.set_target(target);
        Ok(result)
    }
}
