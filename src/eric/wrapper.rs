//! Safe, typed wrapper over [`EricBindings`].
//!
//! An [`EricSession`] owns one ERiC instance between `initialise` and
//! `shutdown`. Return buffers and certificate handles are scoped to a single
//! method call and always released, also when the native call fails.

use std::ffi::CString;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::bindings::{
    BufferHandle, CertHandle, CryptParams, EricBindings, InstanceHandle, PrintParams, ProcessArgs,
    TransferHeaderArgs,
};
use super::codes::{ERIC_OK, SERVER_ERROR_CODES};
use super::errors::{EricError, ProcessFailure, ServerErrorMessage};
use crate::core::{ElsterError, EricResponse, Settings, TransferHeaderFields};
use crate::xml::Element;

pub const ERIC_VALIDIERE: u32 = 1 << 1;
pub const ERIC_SENDE: u32 = 1 << 2;
pub const ERIC_DRUCKE: u32 = 1 << 5;

/// Name of the log file ERiC writes into the log directory.
pub const ERIC_LOG_FILE: &str = "eric.log";

fn check(function: &str, res: i32) -> Result<(), EricError> {
    debug!(function, res, "ERiC call returned");
    if res == ERIC_OK {
        Ok(())
    } else {
        Err(EricError::Process(ProcessFailure::new(res)))
    }
}

/// Reject buffers that are neither empty nor well-formed XML.
fn check_xml(content: &[u8]) -> Result<(), EricError> {
    if content.is_empty() {
        return Ok(());
    }
    let text = std::str::from_utf8(content).map_err(|_| EricError::InvalidXmlReturned)?;
    Element::parse(text).map_err(|_| EricError::InvalidXmlReturned)?;
    Ok(())
}

fn decode(content: Vec<u8>) -> Result<String, EricError> {
    String::from_utf8(content).map_err(|_| EricError::InvalidXmlReturned)
}

fn path_to_cstring(path: &Path) -> Result<CString, EricError> {
    Ok(CString::new(path.to_string_lossy().into_owned())?)
}

/// Keep the first error; log a release error that would otherwise be lost.
fn merge_release<T>(result: Result<T, EricError>, released: Result<(), EricError>, what: &str) -> Result<T, EricError> {
    match (result, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release_error)) => {
            warn!(error = %release_error, "failed to release ERiC {what}");
            Err(e)
        }
    }
}

/// An initialised ERiC instance.
pub struct EricSession<'a, B: EricBindings + ?Sized> {
    bindings: &'a B,
    instance: InstanceHandle,
    settings: &'a Settings,
    shut_down: bool,
}

impl<'a, B: EricBindings + ?Sized> EricSession<'a, B> {
    /// Create the ERiC instance, loading plugins from the configured path and
    /// writing the ERiC log into `log_path`.
    pub fn initialise(bindings: &'a B, settings: &'a Settings, log_path: Option<&Path>) -> Result<Self, EricError> {
        let plugin_path = settings.plugin_path.as_deref().map(path_to_cstring).transpose()?;
        let log_path = log_path.map(path_to_cstring).transpose()?;

        let instance = bindings
            .instance_create(plugin_path.as_deref(), log_path.as_deref())
            .ok_or(EricError::NullReturned)?;
        debug!(instance = instance.as_raw(), "ERiC instance created");

        Ok(Self {
            bindings,
            instance,
            settings,
            shut_down: false,
        })
    }

    /// Release the ERiC instance. The session cannot be used afterwards.
    pub fn shutdown(mut self) -> Result<(), EricError> {
        self.shut_down = true;
        check("EricMtInstanzFreigeben", self.bindings.instance_free(self.instance))
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    pub fn create_buffer(&self) -> Result<BufferHandle, EricError> {
        let buffer = self
            .bindings
            .buffer_create(self.instance)
            .ok_or(EricError::NullReturned)?;
        debug!(buffer = buffer.as_raw(), "ERiC buffer created");
        Ok(buffer)
    }

    pub fn read_buffer(&self, buffer: BufferHandle) -> Result<Vec<u8>, EricError> {
        self.bindings
            .buffer_content(self.instance, buffer)
            .ok_or(EricError::NullReturned)
    }

    pub fn close_buffer(&self, buffer: BufferHandle) -> Result<(), EricError> {
        check("EricMtRueckgabepufferFreigeben", self.bindings.buffer_free(self.instance, buffer))
    }

    /// Run `f` with `N` fresh buffers, releasing all of them afterwards.
    pub fn with_buffers<const N: usize, T>(
        &self,
        f: impl FnOnce([BufferHandle; N]) -> Result<T, EricError>,
    ) -> Result<T, EricError> {
        let mut buffers = [BufferHandle::from_raw(0); N];
        let mut created = 0;
        while created < N {
            match self.create_buffer() {
                Ok(buffer) => {
                    buffers[created] = buffer;
                    created += 1;
                }
                Err(e) => {
                    return merge_release(Err(e), self.close_buffers(&buffers[..created]), "buffer");
                }
            }
        }

        let result = f(buffers);
        merge_release(result, self.close_buffers(&buffers), "buffer")
    }

    pub fn with_buffer<T>(&self, f: impl FnOnce(BufferHandle) -> Result<T, EricError>) -> Result<T, EricError> {
        self.with_buffers(|[buffer]| f(buffer))
    }

    /// Close buffers in reverse creation order; every buffer is attempted.
    fn close_buffers(&self, buffers: &[BufferHandle]) -> Result<(), EricError> {
        let mut first_error = None;
        for buffer in buffers.iter().rev() {
            if let Err(e) = self.close_buffer(*buffer) {
                if first_error.is_some() {
                    warn!(error = %e, "failed to release ERiC buffer");
                } else {
                    first_error = Some(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Call `function` with one buffer and return the buffer's validated content.
    fn call_and_read(&self, function: &str, call: impl FnOnce(BufferHandle) -> i32) -> Result<Vec<u8>, EricError> {
        self.with_buffer(|buffer| {
            check(function, call(buffer))?;
            let content = self.read_buffer(buffer)?;
            check_xml(&content)?;
            Ok(content)
        })
    }

    pub fn get_cert_handle(&self) -> Result<CertHandle, EricError> {
        let path = path_to_cstring(self.settings.cert_path())?;
        let mut cert = CertHandle::default();
        let res = self.bindings.get_handle_to_certificate(self.instance, &mut cert, &path);
        check("EricMtGetHandleToCertificate", res)?;
        Ok(cert)
    }

    pub fn close_cert_handle(&self, cert: CertHandle) -> Result<(), EricError> {
        check(
            "EricMtCloseHandleToCertificate",
            self.bindings.close_handle_to_certificate(self.instance, cert),
        )
    }

    /// Run `f` with a certificate handle, closing it afterwards.
    pub fn with_cert_handle<T>(&self, f: impl FnOnce(CertHandle) -> Result<T, EricError>) -> Result<T, EricError> {
        let cert = self.get_cert_handle()?;
        let result = f(cert);
        merge_release(result, self.close_cert_handle(cert), "certificate handle")
    }

    fn pin(&self) -> Result<CString, EricError> {
        Ok(CString::new(self.settings.cert_pin.as_str())?)
    }

    /// Run `EricMtBearbeiteVorgang`.
    ///
    /// Both return buffers are released on every path. A non-zero result code
    /// becomes [`EricError::Process`] carrying both responses; for header
    /// errors the server's error message is extracted as well.
    pub fn process(
        &self,
        xml: &str,
        datenart_version: &str,
        flags: u32,
        transfer_handle: Option<&mut u32>,
        crypt_params: Option<&CryptParams<'_>>,
        print_params: Option<&PrintParams<'_>>,
    ) -> Result<EricResponse, EricError> {
        debug!(datenart_version, flags, xml, "processing");
        let xml = CString::new(xml)?;
        let datenart_version = CString::new(datenart_version)?;
        let args = ProcessArgs {
            xml: &xml,
            datenart_version: &datenart_version,
            flags,
            print_params,
            crypt_params,
        };

        self.with_buffers(|[eric_buffer, server_buffer]| {
            let res = self
                .bindings
                .process(self.instance, &args, transfer_handle, eric_buffer, server_buffer);
            debug!(res, "EricMtBearbeiteVorgang returned");

            let eric_response = self.read_buffer(eric_buffer)?;
            check_xml(&eric_response)?;
            let server_response = self.read_buffer(server_buffer)?;
            check_xml(&server_response)?;
            debug!(
                eric_response = %String::from_utf8_lossy(&eric_response),
                server_response = %String::from_utf8_lossy(&server_response),
                "ERiC responses"
            );

            if res == ERIC_OK {
                return Ok(EricResponse {
                    result_code: res,
                    eric_response,
                    server_response,
                    pdf: None,
                });
            }

            let server_response = String::from_utf8_lossy(&server_response).into_owned();
            let server_err_msg = if !server_response.is_empty() && SERVER_ERROR_CODES.contains(&res) {
                Some(self.get_error_message_from_xml_response(&server_response)?.1)
            } else {
                None
            };
            Err(EricError::Process(ProcessFailure {
                res_code: res,
                eric_response: String::from_utf8_lossy(&eric_response).into_owned(),
                server_response,
                server_err_msg,
            }))
        })
    }

    /// Validate `xml` against ERiC's plausibility checks without sending it.
    pub fn validate(&self, xml: &str, datenart_version: &str) -> Result<EricResponse, EricError> {
        self.process(xml, datenart_version, ERIC_VALIDIERE, None, None, None)
    }

    /// Send `xml` and return the response together with the printed PDF.
    pub fn validate_and_send(&self, xml: &str, datenart_version: &str) -> Result<EricResponse, EricError> {
        let pdf_file = NamedTempFile::new().map_err(EricError::Workspace)?;
        let mut response = self.validate_and_send_to(xml, datenart_version, Some(pdf_file.path()))?;
        response.pdf = Some(std::fs::read(pdf_file.path()).map_err(EricError::Workspace)?);
        Ok(response)
    }

    /// Send `xml`, printing a PDF to `print_path` when given.
    pub fn validate_and_send_to(
        &self,
        xml: &str,
        datenart_version: &str,
        print_path: Option<&Path>,
    ) -> Result<EricResponse, EricError> {
        let pdf_name = print_path.map(path_to_cstring).transpose()?;
        let print_params = pdf_name.as_deref().map(|name| PrintParams {
            pdf_name: Some(name),
            ..PrintParams::default()
        });
        let flags = if print_params.is_some() {
            ERIC_SENDE | ERIC_DRUCKE
        } else {
            ERIC_SENDE
        };
        let pin = self.pin()?;

        self.with_cert_handle(|cert_handle| {
            let crypt_params = CryptParams {
                cert_handle,
                pin: &pin,
                abruf_code: None,
            };
            self.process(xml, datenart_version, flags, None, Some(&crypt_params), print_params.as_ref())
        })
    }

    /// Validate and send `xml` for a named Verfahren.
    pub fn process_verfahren(
        &self,
        xml: &str,
        verfahren: &str,
        abruf_code: Option<&str>,
        transfer_handle: Option<&mut u32>,
    ) -> Result<EricResponse, EricError> {
        let pin = self.pin()?;
        let abruf_code = abruf_code.map(CString::new).transpose()?;

        self.with_cert_handle(|cert_handle| {
            let crypt_params = CryptParams {
                cert_handle,
                pin: &pin,
                abruf_code: abruf_code.as_deref(),
            };
            self.process(
                xml,
                verfahren,
                ERIC_SENDE | ERIC_VALIDIERE,
                transfer_handle,
                Some(&crypt_params),
                None,
            )
        })
    }

    /// Let ERiC prepend a TransferHeader to the data portion `xml`.
    pub fn create_th(&self, xml: &str, fields: &TransferHeaderFields) -> Result<String, EricError> {
        let xml = CString::new(xml)?;
        let verfahren = CString::new(fields.verfahren.as_str())?;
        let datenart = CString::new(fields.datenart.as_str())?;
        let vorgang = CString::new(fields.vorgang.as_str())?;
        let testmerker = CString::new(fields.testmerker.as_str())?;
        let hersteller_id = CString::new(fields.hersteller_id.as_str())?;
        let daten_lieferant = CString::new(fields.daten_lieferant.as_str())?;
        let version_client = CString::new(fields.version_client.as_str())?;
        let args = TransferHeaderArgs {
            verfahren: &verfahren,
            datenart: &datenart,
            vorgang: &vorgang,
            testmerker: &testmerker,
            hersteller_id: &hersteller_id,
            daten_lieferant: &daten_lieferant,
            version_client: &version_client,
        };

        let content = self.call_and_read("EricMtCreateTH", |buffer| {
            self.bindings.create_th(self.instance, &xml, &args, buffer)
        })?;
        decode(content)
    }

    /// Decrypt one retrieved, base64 encoded Datenpaket.
    pub fn decrypt_data(&self, data: &str) -> Result<String, EricError> {
        let data = CString::new(data)?;
        let pin = self.pin()?;
        let content = self.with_cert_handle(|cert| {
            self.call_and_read("EricMtDekodiereDaten", |buffer| {
                self.bindings.decode_data(self.instance, cert, &pin, &data, buffer)
            })
        })?;
        decode(content)
    }

    /// Split a failed server response into transfer ticket and error details.
    pub fn get_error_message_from_xml_response(
        &self,
        xml: &str,
    ) -> Result<(String, ServerErrorMessage), EricError> {
        let xml = CString::new(xml)?;
        self.with_buffers(|buffers: [BufferHandle; 4]| {
            let res = self
                .bindings
                .get_error_messages_from_xml_answer(self.instance, &xml, buffers);
            check("EricMtGetErrormessagesFromXMLAnswer", res)?;

            let [ticket, th_res_code, th_err_msg, ndh_err_xml] = buffers;
            let read = |buffer: BufferHandle| self.read_buffer(buffer).map(|c| String::from_utf8_lossy(&c).into_owned());
            let transfer_ticket = read(ticket)?;
            let message = ServerErrorMessage {
                th_res_code: read(th_res_code)?,
                th_err_msg: read(th_err_msg)?,
                ndh_err_xml: read(ndh_err_xml)?,
            };
            Ok((transfer_ticket, message))
        })
    }

    /// Property dump of the configured certificate or security token.
    pub fn get_cert_properties(&self) -> Result<String, EricError> {
        let pin = self.pin()?;
        let content = self.with_cert_handle(|cert| {
            self.call_and_read("EricMtHoleZertifikatEigenschaften", |buffer| {
                self.bindings.get_cert_properties(self.instance, cert, &pin, buffer)
            })
        })?;
        decode(content)
    }

    /// Tax offices of one state as ERiC XML.
    pub fn get_tax_offices(&self, state_id: &str) -> Result<String, EricError> {
        let state_id = CString::new(state_id)?;
        let content = self.call_and_read("EricMtHoleFinanzaemter", |buffer| {
            self.bindings.get_tax_offices(self.instance, &state_id, buffer)
        })?;
        decode(content)
    }

    /// State ids as ERiC XML.
    pub fn get_state_id_list(&self) -> Result<String, EricError> {
        let content = self.call_and_read("EricMtHoleFinanzamtLandNummern", |buffer| {
            self.bindings.get_state_id_list(self.instance, buffer)
        })?;
        decode(content)
    }
}

impl<B: EricBindings + ?Sized> Drop for EricSession<'_, B> {
    fn drop(&mut self) {
        if !self.shut_down {
            let res = self.bindings.instance_free(self.instance);
            if res != ERIC_OK {
                warn!(res, "failed to release ERiC instance");
            }
        }
    }
}

/// Open a session, run `f` and shut the session down again.
///
/// ERiC writes its log into a temporary directory which is forwarded to the
/// debug log when `log_eric_debug_info` is set. Native failures are
/// classified before they are returned.
pub fn with_session<B, T, F>(bindings: &B, settings: &Settings, f: F) -> Result<T, ElsterError>
where
    B: EricBindings + ?Sized,
    F: FnOnce(&EricSession<'_, B>) -> Result<T, ElsterError>,
{
    let log_dir = tempfile::tempdir().map_err(EricError::Workspace)?;
    let session = EricSession::initialise(bindings, settings, Some(log_dir.path())).map_err(EricError::classify)?;

    let result = f(&session);
    let shutdown = session.shutdown();

    if settings.log_eric_debug_info {
        log_eric_file(log_dir.path());
    }

    let result = match (result, shutdown) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(ElsterError::from(e)),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(shutdown_error)) => {
            warn!(error = %shutdown_error, "failed to shut down ERiC");
            Err(e)
        }
    };
    result.map_err(ElsterError::classified)
}

/// Forward the ERiC log (Latin-1 encoded) to the debug log.
fn log_eric_file(log_dir: &Path) {
    match std::fs::read(log_dir.join(ERIC_LOG_FILE)) {
        Ok(bytes) => {
            let log: String = bytes.iter().map(|&b| char::from(b)).collect();
            debug!(target: "eric", "{log}");
        }
        Err(e) => debug!(error = %e, "no ERiC log available"),
    }
}

/// Whether the configured credential is a security token of type "Stick".
pub fn verify_using_stick<B: EricBindings + ?Sized>(bindings: &B, settings: &Settings) -> bool {
    match with_session(bindings, settings, |session| Ok(session.get_cert_properties()?)) {
        Ok(properties) => properties.contains("<TokenTyp>Stick</TokenTyp>"),
        Err(e) => {
            debug!(error = %e, "could not verify security token");
            false
        }
    }
}
