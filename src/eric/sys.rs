//! Raw FFI declarations matching `ericapi.h` (multi-threading API).
//!
//! No `#[link]` attribute; build.rs links `libericapi` when the `native`
//! feature is enabled.
#![allow(non_snake_case, non_camel_case_types)]

use std::os::raw::{c_char, c_int, c_void};

pub type EricMtInstanz = c_void;
pub type EricRueckgabepufferHandle = *mut c_void;
pub type EricZertifikatHandle = u32;
pub type EricTransferHandle = u32;

#[repr(C)]
pub struct eric_druck_parameter_t {
    pub version: c_int,
    pub vorschau: c_int,
    pub ersteSeite: c_int,
    pub duplexDruck: c_int,
    pub pdfName: *const c_char,
    pub fussText: *const c_char,
}

#[repr(C)]
pub struct eric_verschluesselungs_parameter_t {
    pub version: c_int,
    pub zertifikatHandle: EricZertifikatHandle,
    pub pin: *const c_char,
    pub abrufCode: *const c_char,
}

unsafe extern "C" {
    pub fn EricMtInstanzErzeugen(pluginPfad: *const c_char, logPfad: *const c_char) -> *mut EricMtInstanz;

    pub fn EricMtInstanzFreigeben(instanz: *mut EricMtInstanz) -> c_int;

    pub fn EricMtRueckgabepufferErzeugen(instanz: *mut EricMtInstanz) -> EricRueckgabepufferHandle;

    pub fn EricMtRueckgabepufferInhalt(
        instanz: *mut EricMtInstanz,
        handle: EricRueckgabepufferHandle,
    ) -> *const c_char;

    pub fn EricMtRueckgabepufferFreigeben(
        instanz: *mut EricMtInstanz,
        handle: EricRueckgabepufferHandle,
    ) -> c_int;

    pub fn EricMtGetHandleToCertificate(
        instanz: *mut EricMtInstanz,
        hToken: *mut EricZertifikatHandle,
        iInfoPinSupport: *mut u32,
        pathToKeystore: *const c_char,
    ) -> c_int;

    pub fn EricMtCloseHandleToCertificate(
        instanz: *mut EricMtInstanz,
        hToken: EricZertifikatHandle,
    ) -> c_int;

    pub fn EricMtHoleZertifikatEigenschaften(
        instanz: *mut EricMtInstanz,
        hToken: EricZertifikatHandle,
        pin: *const c_char,
        rueckgabeXmlPuffer: EricRueckgabepufferHandle,
    ) -> c_int;

    pub fn EricMtBearbeiteVorgang(
        instanz: *mut EricMtInstanz,
        datenpuffer: *const c_char,
        datenartVersion: *const c_char,
        bearbeitungsFlags: u32,
        druckParameter: *const eric_druck_parameter_t,
        cryptoParameter: *const eric_verschluesselungs_parameter_t,
        transferHandle: *mut EricTransferHandle,
        rueckgabeXmlPuffer: EricRueckgabepufferHandle,
        serverantwortXmlPuffer: EricRueckgabepufferHandle,
    ) -> c_int;

    pub fn EricMtCreateTH(
        instanz: *mut EricMtInstanz,
        xml: *const c_char,
        verfahren: *const c_char,
        datenart: *const c_char,
        vorgang: *const c_char,
        testmerker: *const c_char,
        herstellerId: *const c_char,
        datenLieferant: *const c_char,
        versionClient: *const c_char,
        publicKey: *const c_char,
        xmlRueckgabePuffer: EricRueckgabepufferHandle,
    ) -> c_int;

    pub fn EricMtDekodiereDaten(
        instanz: *mut EricMtInstanz,
        zertifikatHandle: EricZertifikatHandle,
        pin: *const c_char,
        base64Eingabe: *const c_char,
        rueckgabePuffer: EricRueckgabepufferHandle,
    ) -> c_int;

    pub fn EricMtGetErrormessagesFromXMLAnswer(
        instanz: *mut EricMtInstanz,
        xml: *const c_char,
        transferticketPuffer: EricRueckgabepufferHandle,
        returncodeTHPuffer: EricRueckgabepufferHandle,
        fehlertextTHPuffer: EricRueckgabepufferHandle,
        returncodesUndFehlertexteNDHXmlPuffer: EricRueckgabepufferHandle,
    ) -> c_int;

    pub fn EricMtHoleFinanzaemter(
        instanz: *mut EricMtInstanz,
        finanzamtLandNummer: *const c_char,
        rueckgabeXmlPuffer: EricRueckgabepufferHandle,
    ) -> c_int;

    pub fn EricMtHoleFinanzamtLandNummern(
        instanz: *mut EricMtInstanz,
        rueckgabeXmlPuffer: EricRueckgabepufferHandle,
    ) -> c_int;
}
