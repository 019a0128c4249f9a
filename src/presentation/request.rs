//! Parse-then-validate for the host's presentation inputs.
//!
//! Only the closed set of shapes below is accepted; nothing is coerced.
use super::Error;
use crate::cbor::{self, Value};
use crate::definitions::{self, traits::FromCbor, IssuerSigned};
use crate::encoding;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// A credential the holder offers for one presentation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestedDocument {
    /// An encoded IssuerSigned, or a stored Document carrying one.
    pub issuer_signed_content: Vec<u8>,
    /// The custodian alias of the document's device key.
    pub alias: String,
    pub doc_type: String,
}

pub type ElementSelection = BTreeMap<String, bool>;
pub type NamespaceSelection = BTreeMap<String, ElementSelection>;

/// The holder's consent: docType → namespace → element identifier → disclose.
///
/// Anything not mapped to `true` is withheld.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AcceptedFields(BTreeMap<String, NamespaceSelection>);

const REQUESTED_DOCUMENT_KEYS: [&str; 3] = ["issuerSignedContent", "alias", "docType"];

impl RequestedDocument {
    pub fn new(
        issuer_signed_content: Vec<u8>,
        alias: impl Into<String>,
        doc_type: impl Into<String>,
    ) -> Self {
        Self {
            issuer_signed_content,
            alias: alias.into(),
            doc_type: doc_type.into(),
        }
    }

    /// Parse `{"issuerSignedContent": base64, "alias": string, "docType": string}`.
    pub fn from_json(index: usize, json: &JsonValue) -> Result<Self, Error> {
        let object = json
            .as_object()
            .ok_or_else(|| Error::parsing(index, None, "a requested document must be an object"))?;
        if let Some(key) = object
            .keys()
            .find(|key| !REQUESTED_DOCUMENT_KEYS.contains(&key.as_str()))
        {
            return Err(Error::InvalidRequest {
                field: format!("documents[{index}].{key}"),
                reason: format!("unexpected key '{key}' in a requested document"),
            });
        }
        let text = |field: &'static str| -> Result<&str, Error> {
            match object.get(field) {
                Some(JsonValue::String(s)) => Ok(s.as_str()),
                Some(_) => Err(Error::parsing(
                    index,
                    Some(field),
                    format!("'{field}' must be a string"),
                )),
                None => Err(Error::parsing(
                    index,
                    Some(field),
                    format!("missing '{field}'"),
                )),
            }
        };
        let issuer_signed_content = encoding::decode_flexible(text("issuerSignedContent")?)
            .map_err(|e| Error::parsing(index, Some("issuerSignedContent"), e))?;
        Ok(Self {
            issuer_signed_content,
            alias: text("alias")?.to_string(),
            doc_type: text("docType")?.to_string(),
        })
    }

    /// Parse a JSON array of requested documents.
    pub fn list_from_json(json: &JsonValue) -> Result<Vec<Self>, Error> {
        json.as_array()
            .ok_or_else(|| Error::InvalidRequest {
                field: "documents".to_string(),
                reason: "expected an array of requested documents".to_string(),
            })?
            .iter()
            .enumerate()
            .map(|(index, document)| Self::from_json(index, document))
            .collect()
    }

    /// Decode the content, unwrapping a stored Document if that is what was supplied.
    pub fn issuer_signed(&self) -> Result<IssuerSigned, definitions::Error> {
        let value = cbor::decode(&self.issuer_signed_content)?;
        let Value::Map(entries) = &value else {
            return Err(definitions::Error::InvalidType {
                field: "issuerSignedContent",
                expected: "a map",
            });
        };
        match entries
            .iter()
            .find(|(key, _)| key.as_text() == Some("issuerSigned"))
        {
            Some((_, issuer_signed)) => IssuerSigned::from_cbor(issuer_signed),
            None => IssuerSigned::from_cbor(&value),
        }
    }
}

fn object<'a>(json: &'a JsonValue, field: &str) -> Result<&'a Map<String, JsonValue>, Error> {
    json.as_object().ok_or_else(|| Error::InvalidRequest {
        field: field.to_string(),
        reason: "expected an object".to_string(),
    })
}

impl AcceptedFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, doc_type: &str, namespace: &str, element: &str, accepted: bool) {
        self.0
            .entry(doc_type.to_string())
            .or_default()
            .entry(namespace.to_string())
            .or_default()
            .insert(element.to_string(), accepted);
    }

    /// Accept one element, creating the docType and namespace entries as needed.
    pub fn accept(mut self, doc_type: &str, namespace: &str, element: &str) -> Self {
        self.insert(doc_type, namespace, element, true);
        self
    }

    /// Add an empty selection for `namespace`: nothing from it is disclosed.
    pub fn with_namespace(mut self, doc_type: &str, namespace: &str) -> Self {
        self.0
            .entry(doc_type.to_string())
            .or_default()
            .entry(namespace.to_string())
            .or_default();
        self
    }

    pub fn contains_doc_type(&self, doc_type: &str) -> bool {
        self.0.contains_key(doc_type)
    }

    pub fn is_accepted(&self, doc_type: &str, namespace: &str, element: &str) -> bool {
        self.0
            .get(doc_type)
            .and_then(|namespaces| namespaces.get(namespace))
            .and_then(|elements| elements.get(element))
            .copied()
            .unwrap_or(false)
    }

    /// Parse `{docType: {namespace: {element: bool}}}`.
    pub fn from_json(json: &JsonValue) -> Result<Self, Error> {
        let mut accepted = BTreeMap::new();
        for (doc_type, namespaces) in object(json, "acceptedFields")? {
            let mut selection = NamespaceSelection::new();
            for (namespace, elements) in object(namespaces, doc_type)? {
                let path = format!("{doc_type}.{namespace}");
                let elements = object(elements, &path)?
                    .iter()
                    .map(|(element, disclose)| match disclose {
                        JsonValue::Bool(disclose) => Ok((element.clone(), *disclose)),
                        _ => Err(Error::InvalidRequest {
                            field: format!("{path}.{element}"),
                            reason: "expected a boolean".to_string(),
                        }),
                    })
                    .collect::<Result<ElementSelection, Error>>()?;
                selection.insert(namespace.clone(), elements);
            }
            accepted.insert(doc_type.clone(), selection);
        }
        Ok(Self(accepted))
    }
}

impl From<BTreeMap<String, NamespaceSelection>> for AcceptedFields {
    fn from(selection: BTreeMap<String, NamespaceSelection>) -> Self {
        Self(selection)
    }
}
