//! [`EricBindings`] backed by the linked ERiC library.

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::ptr;

use super::bindings::{
    BufferHandle, CertHandle, CryptParams, EricBindings, InstanceHandle, PrintParams, ProcessArgs,
    TransferHeaderArgs,
};
use super::sys::{self as eric_sys, eric_druck_parameter_t, eric_verschluesselungs_parameter_t};

/// Parameter struct version expected by ERiC.
const PARAMETER_VERSION: i32 = 2;

/// The process-wide ERiC library.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEric;

fn instance_ptr(instance: InstanceHandle) -> *mut c_void {
    instance.as_raw() as *mut c_void
}

fn buffer_ptr(buffer: BufferHandle) -> *mut c_void {
    buffer.as_raw() as *mut c_void
}

fn opt_ptr(s: Option<&CStr>) -> *const c_char {
    s.map_or(ptr::null(), CStr::as_ptr)
}

fn druck_parameter(params: &PrintParams<'_>) -> eric_druck_parameter_t {
    eric_druck_parameter_t {
        version: PARAMETER_VERSION,
        vorschau: params.preview.into(),
        ersteSeite: params.first_page.into(),
        duplexDruck: params.duplex.into(),
        pdfName: opt_ptr(params.pdf_name),
        fussText: opt_ptr(params.footer),
    }
}

fn verschluesselungs_parameter(params: &CryptParams<'_>) -> eric_verschluesselungs_parameter_t {
    eric_verschluesselungs_parameter_t {
        version: PARAMETER_VERSION,
        zertifikatHandle: params.cert_handle.as_raw(),
        pin: params.pin.as_ptr(),
        abrufCode: opt_ptr(params.abruf_code),
    }
}

impl EricBindings for NativeEric {
    fn instance_create(&self, plugin_path: Option<&CStr>, log_path: Option<&CStr>) -> Option<InstanceHandle> {
        let instance = unsafe { eric_sys::EricMtInstanzErzeugen(opt_ptr(plugin_path), opt_ptr(log_path)) };
        (!instance.is_null()).then(|| InstanceHandle::from_raw(instance as usize))
    }

    fn instance_free(&self, instance: InstanceHandle) -> i32 {
        unsafe { eric_sys::EricMtInstanzFreigeben(instance_ptr(instance)) }
    }

    fn buffer_create(&self, instance: InstanceHandle) -> Option<BufferHandle> {
        let buffer = unsafe { eric_sys::EricMtRueckgabepufferErzeugen(instance_ptr(instance)) };
        (!buffer.is_null()).then(|| BufferHandle::from_raw(buffer as usize))
    }

    fn buffer_content(&self, instance: InstanceHandle, buffer: BufferHandle) -> Option<Vec<u8>> {
        let content = unsafe { eric_sys::EricMtRueckgabepufferInhalt(instance_ptr(instance), buffer_ptr(buffer)) };
        if content.is_null() {
            return None;
        }
        // The buffer stays owned by ERiC until it is freed.
        Some(unsafe { CStr::from_ptr(content) }.to_bytes().to_vec())
    }

    fn buffer_free(&self, instance: InstanceHandle, buffer: BufferHandle) -> i32 {
        unsafe { eric_sys::EricMtRueckgabepufferFreigeben(instance_ptr(instance), buffer_ptr(buffer)) }
    }

    fn get_handle_to_certificate(&self, instance: InstanceHandle, cert: &mut CertHandle, path: &CStr) -> i32 {
        let mut raw = 0u32;
        let res = unsafe {
            eric_sys::EricMtGetHandleToCertificate(instance_ptr(instance), &mut raw, ptr::null_mut(), path.as_ptr())
        };
        *cert = CertHandle::from_raw(raw);
        res
    }

    fn close_handle_to_certificate(&self, instance: InstanceHandle, cert: CertHandle) -> i32 {
        unsafe { eric_sys::EricMtCloseHandleToCertificate(instance_ptr(instance), cert.as_raw()) }
    }

    fn get_cert_properties(
        &self,
        instance: InstanceHandle,
        cert: CertHandle,
        pin: &CStr,
        buffer: BufferHandle,
    ) -> i32 {
        unsafe {
            eric_sys::EricMtHoleZertifikatEigenschaften(
                instance_ptr(instance),
                cert.as_raw(),
                pin.as_ptr(),
                buffer_ptr(buffer),
            )
        }
    }

    fn process(
        &self,
        instance: InstanceHandle,
        args: &ProcessArgs<'_>,
        transfer_handle: Option<&mut u32>,
        eric_buffer: BufferHandle,
        server_buffer: BufferHandle,
    ) -> i32 {
        let druck = args.print_params.map(druck_parameter);
        let crypt = args.crypt_params.map(verschluesselungs_parameter);
        let transfer_handle = transfer_handle.map_or(ptr::null_mut(), |h| h as *mut u32);

        unsafe {
            eric_sys::EricMtBearbeiteVorgang(
                instance_ptr(instance),
                args.xml.as_ptr(),
                args.datenart_version.as_ptr(),
                args.flags,
                druck.as_ref().map_or(ptr::null(), |d| d as *const _),
                crypt.as_ref().map_or(ptr::null(), |c| c as *const _),
                transfer_handle,
                buffer_ptr(eric_buffer),
                buffer_ptr(server_buffer),
            )
        }
    }

    fn create_th(
        &self,
        instance: InstanceHandle,
        xml: &CStr,
        args: &TransferHeaderArgs<'_>,
        buffer: BufferHandle,
    ) -> i32 {
        unsafe {
            eric_sys::EricMtCreateTH(
                instance_ptr(instance),
                xml.as_ptr(),
                args.verfahren.as_ptr(),
                args.datenart.as_ptr(),
                args.vorgang.as_ptr(),
                args.testmerker.as_ptr(),
                args.hersteller_id.as_ptr(),
                args.daten_lieferant.as_ptr(),
                args.version_client.as_ptr(),
                ptr::null(),
                buffer_ptr(buffer),
            )
        }
    }

    fn decode_data(
        &self,
        instance: InstanceHandle,
        cert: CertHandle,
        pin: &CStr,
        data: &CStr,
        buffer: BufferHandle,
    ) -> i32 {
        unsafe {
            eric_sys::EricMtDekodiereDaten(
                instance_ptr(instance),
                cert.as_raw(),
                pin.as_ptr(),
                data.as_ptr(),
                buffer_ptr(buffer),
            )
        }
    }

    fn get_error_messages_from_xml_answer(
        &self,
        instance: InstanceHandle,
        xml: &CStr,
        buffers: [BufferHandle; 4],
    ) -> i32 {
        let [ticket, th_res_code, th_err_msg, ndh_err_xml] = buffers;
        unsafe {
            eric_sys::EricMtGetErrormessagesFromXMLAnswer(
                instance_ptr(instance),
                xml.as_ptr(),
                buffer_ptr(ticket),
                buffer_ptr(th_res_code),
                buffer_ptr(th_err_msg),
                buffer_ptr(ndh_err_xml),
            )
        }
    }

    fn get_tax_offices(&self, instance: InstanceHandle, state_id: &CStr, buffer: BufferHandle) -> i32 {
        unsafe { eric_sys::EricMtHoleFinanzaemter(instance_ptr(instance), state_id.as_ptr(), buffer_ptr(buffer)) }
    }

    fn get_state_id_list(&self, instance: InstanceHandle, buffer: BufferHandle) -> i32 {
        unsafe { eric_sys::EricMtHoleFinanzamtLandNummern(instance_ptr(instance), buffer_ptr(buffer)) }
    }
}
