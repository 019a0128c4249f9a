//! The boundary with the proximity transport (BLE, NFC).
//!
//! The transport itself lives outside this crate. It reports what happens on the connection as
//! [TransportEvent]s on a channel the caller owns, and this crate only ever hands it encoded
//! DeviceResponse bytes or a session status.
use crate::config::ResponseConfig;
use crate::custodian::KeyCustodian;
use crate::definitions::{self, DeviceRequest};
use crate::presentation::{self, create_response, AcceptedFields, RequestedDocument};
use serde_json::Value as JsonValue;
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    Connecting,
    Connected,
    /// A decrypted SessionData payload: an encoded DeviceRequest.
    DocumentRequestReceived(Vec<u8>),
    Disconnected,
    Error(String),
}

/// SessionData status codes (ISO/IEC 18013-5 table 20).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionDataStatus {
    SessionEncryptionError,
    CborDecodingError,
    SessionTerminated,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown session status code {0}")]
    UnknownStatus(u64),
    #[error("no presentation session is active")]
    NoActiveSession,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unable to decode the device request: {0}")]
    Request(#[from] definitions::Error),
    #[error(transparent)]
    Presentation(#[from] presentation::Error),
}

impl From<SessionDataStatus> for u64 {
    fn from(status: SessionDataStatus) -> u64 {
        match status {
            SessionDataStatus::SessionEncryptionError => 10,
            SessionDataStatus::CborDecodingError => 11,
            SessionDataStatus::SessionTerminated => 20,
        }
    }
}

impl TryFrom<u64> for SessionDataStatus {
    type Error = Error;

    fn try_from(code: u64) -> Result<Self, Error> {
        match code {
            10 => Ok(SessionDataStatus::SessionEncryptionError),
            11 => Ok(SessionDataStatus::CborDecodingError),
            20 => Ok(SessionDataStatus::SessionTerminated),
            _ => Err(Error::UnknownStatus(code)),
        }
    }
}

/// A proximity transport, started once per presentation.
pub trait Transport {
    /// Begin engagement. Events are sent on `events` until the transport is closed.
    fn start(&mut self, events: Sender<TransportEvent>) -> Result<(), Error>;
    /// The `mdoc:` URI to render as a QR code, once engagement has started.
    fn qr_code_string(&self) -> Option<String>;
    fn send_response(&mut self, response: Vec<u8>) -> Result<(), Error>;
    fn send_error_response(&mut self, status: SessionDataStatus) -> Result<(), Error>;
    /// Release the connection and any advertising or scanning state.
    fn close(&mut self);
}

/// Owns at most one transport at a time.
pub struct PresentationSession<'a, T: Transport> {
    custodian: &'a dyn KeyCustodian,
    config: ResponseConfig,
    transport: Option<T>,
}

impl<'a, T: Transport> PresentationSession<'a, T> {
    pub fn new(custodian: &'a dyn KeyCustodian, config: ResponseConfig) -> Self {
        Self {
            custodian,
            config,
            transport: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.transport.is_some()
    }

    /// Start `transport`, closing the active one first. The caller receives the events.
    pub fn start(&mut self, mut transport: T) -> Result<Receiver<TransportEvent>, Error> {
        self.close();
        let (sender, receiver) = mpsc::channel();
        transport.start(sender)?;
        tracing::debug!("presentation session started");
        self.transport = Some(transport);
        Ok(receiver)
    }

    pub fn qr_code_string(&self) -> Option<String> {
        self.transport.as_ref().and_then(T::qr_code_string)
    }

    fn transport(&mut self) -> Result<&mut T, Error> {
        self.transport.as_mut().ok_or(Error::NoActiveSession)
    }

    /// Decode a received DeviceRequest into the JSON a host presents for consent.
    ///
    /// A request that cannot be decoded is answered with status 11 before the error is returned.
    pub fn handle_request(&mut self, request: &[u8]) -> Result<JsonValue, Error> {
        let transport = self.transport()?;
        match DeviceRequest::from_bytes(request) {
            Ok(request) => Ok(request.to_request_json()),
            Err(e) => {
                tracing::warn!(error = %e, "undecodable device request");
                transport.send_error_response(SessionDataStatus::CborDecodingError)?;
                Err(e.into())
            }
        }
    }

    /// Generate the DeviceResponse for the holder's consent and send it.
    pub fn respond(
        &mut self,
        documents: &[RequestedDocument],
        accepted: &AcceptedFields,
        session_transcript: &[u8],
    ) -> Result<(), Error> {
        if self.transport.is_none() {
            return Err(Error::NoActiveSession);
        }
        let response = create_response(
            self.custodian,
            documents,
            accepted,
            session_transcript,
            &self.config,
        )?;
        self.transport()?.send_response(response)
    }

    /// Tell the reader the session is over, then close.
    pub fn terminate(&mut self) -> Result<(), Error> {
        let result = self
            .transport()?
            .send_error_response(SessionDataStatus::SessionTerminated);
        self.close();
        result
    }

    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
            tracing::debug!("presentation session closed");
        }
    }
}

impl<T: Transport> Drop for PresentationSession<'_, T> {
    fn drop(&mut self) {
        self.close();
    }
}
