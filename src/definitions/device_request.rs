use crate::cbor::Value;
use crate::definitions::helpers::{NonEmptyVec, Tag24};
use crate::definitions::{traits::FromCbor, Error};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::BTreeMap;

pub type ItemsRequestBytes = Tag24<ItemsRequest>;
pub type DocType = String;
pub type NameSpace = String;
pub type IntentToRetain = bool;
pub type DataElementIdentifier = String;
pub type DataElements = BTreeMap<DataElementIdentifier, IntentToRetain>;
pub type Namespaces = BTreeMap<NameSpace, DataElements>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    pub version: String,
    pub doc_requests: NonEmptyVec<DocRequest>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocRequest {
    pub items_request: ItemsRequestBytes,
    /// Passed through unverified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reader_auth: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsRequest {
    pub doc_type: DocType,
    #[serde(rename = "nameSpaces")]
    pub namespaces: Namespaces,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_info: Option<Value>,
}

impl DeviceRequest {
    pub const VERSION: &'static str = "1.0";

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Self::from_cbor_bytes(bytes)
    }

    /// The request as presented to the holder for consent:
    /// `{"request": {docType: {namespace: {element: intentToRetain}, "isAuthenticated": false}}}`.
    ///
    /// Requests for the same docType are merged.
    pub fn to_request_json(&self) -> JsonValue {
        let mut request = Map::new();
        for doc_request in self.doc_requests.iter() {
            let items = doc_request.items_request.as_ref();
            let entry = request
                .entry(items.doc_type.clone())
                .or_insert_with(|| json!({ "isAuthenticated": false }));
            for (namespace, elements) in &items.namespaces {
                let namespace = &mut entry[namespace.as_str()];
                if !namespace.is_object() {
                    *namespace = JsonValue::Object(Map::new());
                }
                for (element, intent_to_retain) in elements {
                    namespace[element.as_str()] = JsonValue::Bool(*intent_to_retain);
                }
            }
        }
        json!({ "request": request })
    }
}
