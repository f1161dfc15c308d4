//! The narrow call surface of the ERiC library.
//!
//! [`EricBindings`] mirrors the multi-threading API (`EricMt*`) one function
//! per method: arguments are C strings, outputs are written into ERiC-owned
//! return buffers, and every call reports an `i32` result code. Nothing here
//! interprets result codes; that is the job of [`EricSession`](super::EricSession).

use std::ffi::CStr;

/// Opaque ERiC instance (`EricMtInstanz*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(usize);

/// Opaque return buffer (`EricRueckgabepufferHandle`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(usize);

/// Certificate handle (`EricZertifikatHandle`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CertHandle(u32);

impl InstanceHandle {
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> usize {
        self.0
    }
}

impl BufferHandle {
    pub fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> usize {
        self.0
    }
}

impl CertHandle {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Print settings (`eric_druck_parameter_t`).
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintParams<'a> {
    pub preview: bool,
    pub first_page: bool,
    pub duplex: bool,
    /// Target PDF file.
    pub pdf_name: Option<&'a CStr>,
    pub footer: Option<&'a CStr>,
}

/// Signing and encryption settings (`eric_verschluesselungs_parameter_t`).
#[derive(Debug, Clone, Copy)]
pub struct CryptParams<'a> {
    pub cert_handle: CertHandle,
    pub pin: &'a CStr,
    pub abruf_code: Option<&'a CStr>,
}

/// Arguments of `EricMtBearbeiteVorgang`.
#[derive(Debug, Clone, Copy)]
pub struct ProcessArgs<'a> {
    pub xml: &'a CStr,
    /// Datenart version or Verfahren name, e.g. `ESt_2020` or `SpezRechtAntrag`.
    pub datenart_version: &'a CStr,
    pub flags: u32,
    pub print_params: Option<&'a PrintParams<'a>>,
    pub crypt_params: Option<&'a CryptParams<'a>>,
}

/// Arguments of `EricMtCreateTH`.
#[derive(Debug, Clone, Copy)]
pub struct TransferHeaderArgs<'a> {
    pub verfahren: &'a CStr,
    pub datenart: &'a CStr,
    pub vorgang: &'a CStr,
    pub testmerker: &'a CStr,
    pub hersteller_id: &'a CStr,
    pub daten_lieferant: &'a CStr,
    pub version_client: &'a CStr,
}

/// Raw ERiC functions. Implementations must not be called concurrently for
/// the same instance.
pub trait EricBindings {
    /// `EricMtInstanzErzeugen`; `None` for a null instance.
    fn instance_create(&self, plugin_path: Option<&CStr>, log_path: Option<&CStr>) -> Option<InstanceHandle>;

    /// `EricMtInstanzFreigeben`
    fn instance_free(&self, instance: InstanceHandle) -> i32;

    /// `EricMtRueckgabepufferErzeugen`; `None` for a null buffer.
    fn buffer_create(&self, instance: InstanceHandle) -> Option<BufferHandle>;

    /// `EricMtRueckgabepufferInhalt`; `None` for a null pointer.
    fn buffer_content(&self, instance: InstanceHandle, buffer: BufferHandle) -> Option<Vec<u8>>;

    /// `EricMtRueckgabepufferFreigeben`
    fn buffer_free(&self, instance: InstanceHandle, buffer: BufferHandle) -> i32;

    /// `EricMtGetHandleToCertificate`
    fn get_handle_to_certificate(&self, instance: InstanceHandle, cert: &mut CertHandle, path: &CStr) -> i32;

    /// `EricMtCloseHandleToCertificate`
    fn close_handle_to_certificate(&self, instance: InstanceHandle, cert: CertHandle) -> i32;

    /// `EricMtHoleZertifikatEigenschaften`
    fn get_cert_properties(
        &self,
        instance: InstanceHandle,
        cert: CertHandle,
        pin: &CStr,
        buffer: BufferHandle,
    ) -> i32;

    /// `EricMtBearbeiteVorgang`
    fn process(
        &self,
        instance: InstanceHandle,
        args: &ProcessArgs<'_>,
        transfer_handle: Option<&mut u32>,
        eric_buffer: BufferHandle,
        server_buffer: BufferHandle,
    ) -> i32;

    /// `EricMtCreateTH`
    fn create_th(
        &self,
        instance: InstanceHandle,
        xml: &CStr,
        args: &TransferHeaderArgs<'_>,
        buffer: BufferHandle,
    ) -> i32;

    /// `EricMtDekodiereDaten`
    fn decode_data(
        &self,
        instance: InstanceHandle,
        cert: CertHandle,
        pin: &CStr,
        data: &CStr,
        buffer: BufferHandle,
    ) -> i32;

    /// `EricMtGetErrormessagesFromXMLAnswer`. The buffers receive, in order:
    /// transfer ticket, TransferHeader result code, TransferHeader error
    /// text, NutzdatenHeader error XML.
    fn get_error_messages_from_xml_answer(
        &self,
        instance: InstanceHandle,
        xml: &CStr,
        buffers: [BufferHandle; 4],
    ) -> i32;

    /// `EricMtHoleFinanzaemter`
    fn get_tax_offices(&self, instance: InstanceHandle, state_id: &CStr, buffer: BufferHandle) -> i32;

    /// `EricMtHoleFinanzamtLandNummern`
    fn get_state_id_list(&self, instance: InstanceHandle, buffer: BufferHandle) -> i32;
}
