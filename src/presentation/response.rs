//! The response generator.
//!
//! ```text
//! Idle -> DocumentsParsed -> FieldsFiltered -> TranscriptBound -> Signed -> Serialized
//! ```
//!
//! Any failure moves the generator to `Failed`, and no partial response is ever produced.
use super::{AcceptedFields, Error, RequestedDocument};
use crate::cbor;
use crate::config::{ResponseConfig, UnacceptedDocTypePolicy};
use crate::cose::{self, PublicKey};
use crate::custodian::KeyCustodian;
use crate::definitions::{
    device_key::CoseKey,
    helpers::{EmbeddedSign1, Tag24},
    traits::ToCbor,
    DeviceAuth, DeviceAuthentication, DeviceNamespaces, DeviceResponse, DeviceSigned, Document,
    IssuerSigned, Mso,
};
use crate::error::{Error as ApiError, ErrorCode};

/// A requested document once its content has been decoded.
#[derive(Clone, Debug)]
pub struct ParsedDocument {
    pub index: usize,
    pub alias: String,
    pub doc_type: String,
    pub issuer_signed: IssuerSigned,
    mso: Mso,
}

#[derive(Debug, Default)]
pub enum State {
    #[default]
    Idle,
    DocumentsParsed(Vec<ParsedDocument>),
    FieldsFiltered(Vec<ParsedDocument>),
    TranscriptBound {
        documents: Vec<ParsedDocument>,
        /// The transcript exactly as the host supplied it.
        transcript: Vec<u8>,
    },
    Signed(DeviceResponse),
    Serialized(Vec<u8>),
    Failed(String),
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::Idle => "Idle",
            State::DocumentsParsed(_) => "DocumentsParsed",
            State::FieldsFiltered(_) => "FieldsFiltered",
            State::TranscriptBound { .. } => "TranscriptBound",
            State::Signed(_) => "Signed",
            State::Serialized(_) => "Serialized",
            State::Failed(_) => "Failed",
        }
    }
}

/// Builds one DeviceResponse. Each step consumes the output of the previous one.
pub struct ResponseGenerator<'a> {
    custodian: &'a dyn KeyCustodian,
    config: ResponseConfig,
    state: State,
}

/// Run the generator through every step.
pub fn create_response(
    custodian: &dyn KeyCustodian,
    documents: &[RequestedDocument],
    accepted: &AcceptedFields,
    session_transcript: &[u8],
    config: &ResponseConfig,
) -> Result<Vec<u8>, Error> {
    let mut generator = ResponseGenerator::new(custodian, config.clone());
    generator.parse_documents(documents)?;
    generator.filter_fields(accepted)?;
    generator.bind_transcript(session_transcript)?;
    generator.sign()?;
    generator.serialize()
}

impl<'a> ResponseGenerator<'a> {
    pub fn new(custodian: &'a dyn KeyCustodian, config: ResponseConfig) -> Self {
        Self {
            custodian,
            config,
            state: State::Idle,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    fn transition(&mut self, next: State) {
        tracing::debug!(from = self.state.name(), to = next.name(), "response generator");
        self.state = next;
    }

    fn fail(&mut self, error: Error) -> Error {
        tracing::debug!(from = self.state.name(), %error, "response generator failed");
        self.state = State::Failed(error.to_string());
        error
    }

    fn misuse(&mut self, operation: &'static str, state: State) -> Error {
        let error = Error::InvalidState {
            operation,
            state: state.name(),
        };
        self.state = state;
        error
    }

    /// Decode every requested document. Idle -> DocumentsParsed.
    pub fn parse_documents(&mut self, documents: &[RequestedDocument]) -> Result<(), Error> {
        match std::mem::take(&mut self.state) {
            State::Idle => (),
            other => return Err(self.misuse("parse documents", other)),
        }
        let parsed = documents
            .iter()
            .enumerate()
            .map(|(index, document)| {
                let issuer_signed = document
                    .issuer_signed()
                    .map_err(|e| Error::parsing(index, Some("issuerSignedContent"), e))?;
                let mso = issuer_signed
                    .mso()
                    .map_err(|e| Error::parsing(index, Some("issuerAuth"), e))?;
                if mso.doc_type != document.doc_type {
                    let e = ApiError::new(
                        ErrorCode::SchemaViolation,
                        format!(
                            "requested docType '{}' does not match the signed docType '{}'",
                            document.doc_type, mso.doc_type
                        ),
                    )
                    .with_field("docType");
                    return Err(Error::document(index, &document.doc_type, e));
                }
                Ok(ParsedDocument {
                    index,
                    alias: document.alias.clone(),
                    doc_type: document.doc_type.clone(),
                    issuer_signed,
                    mso,
                })
            })
            .collect::<Result<Vec<_>, Error>>();
        match parsed {
            Ok(parsed) => {
                self.transition(State::DocumentsParsed(parsed));
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Withhold everything the holder did not accept. DocumentsParsed -> FieldsFiltered.
    pub fn filter_fields(&mut self, accepted: &AcceptedFields) -> Result<(), Error> {
        let documents = match std::mem::take(&mut self.state) {
            State::DocumentsParsed(documents) => documents,
            other => return Err(self.misuse("filter fields", other)),
        };
        let mut filtered = Vec::with_capacity(documents.len());
        for mut document in documents {
            if !accepted.contains_doc_type(&document.doc_type) {
                match self.config.unaccepted_doc_type {
                    UnacceptedDocTypePolicy::Omit => {
                        tracing::warn!(
                            index = document.index,
                            doc_type = document.doc_type.as_str(),
                            "no accepted fields for document, omitting it"
                        );
                        continue;
                    }
                    UnacceptedDocTypePolicy::IncludeSuppressed => {
                        tracing::warn!(
                            index = document.index,
                            doc_type = document.doc_type.as_str(),
                            "no accepted fields for document, disclosing nothing"
                        );
                    }
                }
            }
            let doc_type = document.doc_type.clone();
            document.issuer_signed.retain(|namespace, item| {
                accepted.is_accepted(&doc_type, namespace, &item.element_identifier)
            });
            if self.config.verify_issuer_digests {
                let mso = &document.mso;
                if let Err(e) = mso.validate_namespaces(&document.issuer_signed.namespaces) {
                    let e = Error::document(document.index, &document.doc_type, e);
                    return Err(self.fail(e));
                }
            }
            filtered.push(document);
        }
        self.transition(State::FieldsFiltered(filtered));
        Ok(())
    }

    /// Attach the encoded SessionTranscript. FieldsFiltered -> TranscriptBound.
    ///
    /// The bytes must hold exactly one CBOR item. They are signed as given, without re-encoding.
    pub fn bind_transcript(&mut self, session_transcript: &[u8]) -> Result<(), Error> {
        let documents = match std::mem::take(&mut self.state) {
            State::FieldsFiltered(documents) => documents,
            other => return Err(self.misuse("bind a transcript", other)),
        };
        match cbor::from_slice(session_transcript) {
            Ok(_) => (),
            Err(e) => {
                let e = Error::Other(Box::new(
                    ApiError::new(
                        ErrorCode::TranscriptError,
                        format!("session transcript is not CBOR: {e}"),
                    )
                    .with_field("sessionTranscript"),
                ));
                return Err(self.fail(e));
            }
        };
        self.transition(State::TranscriptBound {
            documents,
            transcript: session_transcript.to_vec(),
        });
        Ok(())
    }

    /// Sign a DeviceAuthentication for every document. TranscriptBound -> Signed.
    pub fn sign(&mut self) -> Result<(), Error> {
        let (documents, transcript) = match std::mem::take(&mut self.state) {
            State::TranscriptBound {
                documents,
                transcript,
            } => (documents, transcript),
            other => return Err(self.misuse("sign", other)),
        };
        let signed = documents
            .into_iter()
            .map(|document| {
                let index = document.index;
                let doc_type = document.doc_type.clone();
                self.sign_document(document, &transcript)
                    .map_err(|e| Error::document(index, &doc_type, e))
            })
            .collect::<Result<Vec<_>, Error>>();
        match signed {
            Ok(documents) => {
                self.transition(State::Signed(DeviceResponse::new(documents)));
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn sign_document(
        &self,
        document: ParsedDocument,
        transcript: &[u8],
    ) -> Result<Document, ApiError> {
        if self.config.check_device_key_binding {
            self.check_device_key(&document)?;
        }
        let namespaces = Tag24::new(DeviceNamespaces::default())
            .map_err(|e| ApiError::new(ErrorCode::SchemaViolation, e.to_string()))?;
        let payload = DeviceAuthentication::new(
            transcript.to_vec(),
            document.doc_type.clone(),
            namespaces.clone(),
        )
        .to_tagged_bytes()?;
        let signature = cose::sign_detached(self.custodian, &document.alias, &payload)?;
        Ok(Document {
            doc_type: document.doc_type,
            issuer_signed: document.issuer_signed,
            device_signed: Some(DeviceSigned {
                namespaces,
                device_auth: DeviceAuth::DeviceSignature(EmbeddedSign1::new(signature)?),
            }),
            errors: None,
        })
    }

    fn check_device_key(&self, document: &ParsedDocument) -> Result<(), ApiError> {
        let mso = &document.mso;
        let jwk = self.custodian.public_key(&document.alias)?;
        let key = PublicKey::try_from(&jwk)?;
        if !CoseKey::from(&key).same_key(&mso.device_key_info.device_key) {
            return Err(ApiError::new(
                ErrorCode::SchemaViolation,
                format!(
                    "the key under alias '{}' is not the device key of the document",
                    document.alias
                ),
            )
            .with_field("deviceKeyInfo"));
        }
        Ok(())
    }

    /// Encode the response. Signed -> Serialized.
    pub fn serialize(&mut self) -> Result<Vec<u8>, Error> {
        let response = match std::mem::take(&mut self.state) {
            State::Signed(response) => response,
            other => return Err(self.misuse("serialize", other)),
        };
        match response.to_cbor_bytes() {
            Ok(bytes) => {
                self.transition(State::Serialized(bytes.clone()));
                Ok(bytes)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }
}
