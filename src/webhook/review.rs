//! AdmissionReview wire format
//!
//! `request.object` is kept as raw JSON so that an object which is not a Pod
//! is answered with a deny for that request instead of failing the envelope.
//! `response.patch` travels as standard padded base64, the encoding the API
//! server expects for a `[]byte` field.

use base64::{engine::general_purpose::STANDARD, Engine};
use kube::core::admission::{Operation, PatchType};
use kube::core::{GroupVersionKind, GroupVersionResource, Status, TypeMeta};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// API version of the only review format this webhook speaks
pub const ADMISSION_API_VERSION: &str = "admission.k8s.io/v1";

/// Kind of the review envelope
pub const ADMISSION_KIND: &str = "AdmissionReview";

/// The envelope exchanged with the API server in both directions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    /// `apiVersion` and `kind` of the envelope
    #[serde(flatten)]
    pub types: TypeMeta,

    /// Set on the way in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,

    /// Set on the way out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

/// The request half of an [`AdmissionReview`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    /// Correlates the response with this request
    pub uid: String,

    /// Kind of the object under admission
    pub kind: GroupVersionKind,

    /// Resource being requested
    pub resource: GroupVersionResource,

    /// Subresource, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_resource: Option<String>,

    /// Object name; empty when the name is generated server-side
    #[serde(default)]
    pub name: String,

    /// Namespace of the object, if namespaced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Operation being performed
    pub operation: Operation,

    /// The object as sent by the client, undecoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,

    /// Whether the request is a dry run
    #[serde(default)]
    pub dry_run: bool,
}

/// The response half of an [`AdmissionReview`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// Echoed from the request
    pub uid: String,

    /// Whether the object may be admitted
    pub allowed: bool,

    /// Reason for a deny
    #[serde(rename = "status", default)]
    pub result: Status,

    /// Serialized JSON Patch, base64 on the wire
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_bytes")]
    pub patch: Option<Vec<u8>>,

    /// Always `JSONPatch` when a patch is present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,
}

impl AdmissionReview {
    /// Take the request out of a decoded review
    pub fn into_request(self) -> Option<AdmissionRequest> {
        self.request
    }
}

impl AdmissionRequest {
    /// Start an allowing response for this request
    pub fn allow(&self) -> AdmissionResponse {
        AdmissionResponse {
            uid: self.uid.clone(),
            allowed: true,
            result: Status::default(),
            patch: None,
            patch_type: None,
        }
    }
}

impl AdmissionResponse {
    /// Deny with a message that is shown to the client
    #[must_use]
    pub fn deny(mut self, message: impl Into<String>) -> Self {
        let message: String = message.into();
        self.allowed = false;
        self.result = Status::failure(&message, "BadRequest").with_code(400);
        self.patch = None;
        self.patch_type = None;
        self
    }

    /// Attach a JSON Patch to an allowing response
    pub fn with_patch(mut self, patch: &json_patch::Patch) -> Result<Self, serde_json::Error> {
        self.patch = Some(serde_json::to_vec(patch)?);
        self.patch_type = Some(PatchType::JsonPatch);
        Ok(self)
    }

    /// Wrap this response in an outbound `admission.k8s.io/v1` review
    pub fn into_review(self) -> AdmissionReview {
        AdmissionReview {
            types: TypeMeta {
                api_version: ADMISSION_API_VERSION.to_string(),
                kind: ADMISSION_KIND.to_string(),
            },
            request: None,
            response: Some(self),
        }
    }
}

mod base64_bytes {
    use super::{Engine, STANDARD};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match bytes {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded).map_err(de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_patch::{AddOperation, Patch, PatchOperation};
    use jsonptr::PointerBuf;
    use serde_json::json;

    fn request(object: Value) -> AdmissionRequest {
        let review: AdmissionReview = serde_json::from_value(json!({
            "apiVersion": ADMISSION_API_VERSION,
            "kind": ADMISSION_KIND,
            "request": {
                "uid": "uid-1",
                "kind": {"group": "", "version": "v1", "kind": "Pod"},
                "resource": {"group": "", "version": "v1", "resource": "pods"},
                "operation": "CREATE",
                "userInfo": {"username": "admin"},
                "object": object,
            }
        }))
        .unwrap();
        review.into_request().unwrap()
    }

    fn add_team() -> Patch {
        Patch(vec![PatchOperation::Add(AddOperation {
            path: PointerBuf::from_tokens(["metadata", "labels", "team"]),
            value: json!("x"),
        })])
    }

    /// Story: any JSON under `object` survives envelope decoding untouched
    #[test]
    fn story_object_is_kept_raw() {
        for object in [json!("not a pod"), json!({"metadata": 5}), json!([1, 2])] {
            assert_eq!(request(object.clone()).object, Some(object));
        }
        assert_eq!(request(Value::Null).object, None);
    }

    /// Story: the patch is written as a base64 string next to its type tag
    #[test]
    fn story_patch_is_base64_on_the_wire() {
        let response = request(json!({})).allow().with_patch(&add_team()).unwrap();
        let wire = serde_json::to_value(response.into_review()).unwrap();

        assert_eq!(wire["apiVersion"], ADMISSION_API_VERSION);
        assert_eq!(wire["kind"], ADMISSION_KIND);
        assert_eq!(wire["response"]["uid"], "uid-1");
        assert_eq!(wire["response"]["patchType"], "JSONPatch");

        let encoded = wire["response"]["patch"].as_str().expect("patch should be a string");
        let ops: Value = serde_json::from_slice(&STANDARD.decode(encoded).unwrap()).unwrap();
        assert_eq!(ops[0]["path"], "/metadata/labels/team");
    }

    /// Story: a deny carries a failure status and never a patch
    #[test]
    fn story_deny_drops_patch_and_sets_status() {
        let response = request(json!({}))
            .allow()
            .with_patch(&add_team())
            .unwrap()
            .deny("nope");
        let wire = serde_json::to_value(&response).unwrap();

        assert_eq!(wire["allowed"], false);
        assert_eq!(wire["status"]["message"], "nope");
        assert_eq!(wire["status"]["code"], 400);
        assert!(wire.get("patch").is_none());
        assert!(wire.get("patchType").is_none());
    }

    #[test]
    fn response_reads_back_its_own_encoding() {
        let response = request(json!({})).allow().with_patch(&add_team()).unwrap();
        let decoded: AdmissionResponse =
            serde_json::from_str(&serde_json::to_string(&response).unwrap()).unwrap();
        assert_eq!(decoded.patch, response.patch);
        assert_eq!(decoded.patch_type, Some(PatchType::JsonPatch));
    }

    #[test]
    fn plain_allow_has_no_patch_fields() {
        let wire = serde_json::to_value(request(json!({})).allow()).unwrap();
        assert_eq!(wire["allowed"], true);
        assert!(wire.get("patch").is_none());
        assert!(wire.get("patchType").is_none());
    }

    #[test]
    fn envelope_without_type_meta_is_rejected() {
        assert!(serde_json::from_str::<AdmissionReview>(r#"{"hello": "world"}"#).is_err());
    }
}
