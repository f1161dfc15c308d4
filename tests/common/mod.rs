//! Scripted stand-in for the ERiC library.
//!
//! `MockEric` implements [`EricBindings`] in memory: it hands out handles,
//! tracks every create/free pair, records the calls it receives and answers
//! `EricMtBearbeiteVorgang` from a queue of scripted results.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::ffi::CStr;
use std::sync::Once;

use elster_transfer::eric::{
    BufferHandle, CertHandle, ERIC_DRUCKE, EricBindings, InstanceHandle, ProcessArgs, TransferHeaderArgs,
};

pub const MOCK_PDF: &[u8] = b"%PDF-1.4 mock";
pub const GLOBAL_UNKNOWN: i32 = 610001001;
pub const CRYPT_CREATE_KEY: i32 = 610201016;
pub const TRANSFER_ERR_XML_NHEADER: i32 = 610101292;

pub const STATE_LIST_XML: &str = r#"<EricHoleFinanzamtLandNummern xmlns="http://www.elster.de/EricXML/1.0/EricHoleFinanzamtLandNummern"><FinanzamtLand><FinanzamtLandNummer>28</FinanzamtLandNummer><Name>Baden-Württemberg</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>91</FinanzamtLandNummer><Name>Bayern (Zuständigkeit LfSt - München)</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>92</FinanzamtLandNummer><Name>Bayern (Zuständigkeit LfSt - Nürnberg)</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>11</FinanzamtLandNummer><Name>Berlin</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>30</FinanzamtLandNummer><Name>Brandenburg</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>24</FinanzamtLandNummer><Name>Bremen</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>22</FinanzamtLandNummer><Name>Hamburg</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>26</FinanzamtLandNummer><Name>Hessen</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>40</FinanzamtLandNummer><Name>Mecklenburg-Vorpommern</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>23</FinanzamtLandNummer><Name>Niedersachsen</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>51</FinanzamtLandNummer><Name>Nordrhein-Westfalen (Rheinland)</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>53</FinanzamtLandNummer><Name>Nordrhein-Westfalen (Westfalen)</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>27</FinanzamtLandNummer><Name>Rheinland-Pfalz</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>10</FinanzamtLandNummer><Name>Saarland</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>32</FinanzamtLandNummer><Name>Sachsen</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>31</FinanzamtLandNummer><Name>Sachsen-Anhalt</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>21</FinanzamtLandNummer><Name>Schleswig-Holstein</Name></FinanzamtLand><FinanzamtLand><FinanzamtLandNummer>41</FinanzamtLandNummer><Name>Thüringen</Name></FinanzamtLand></EricHoleFinanzamtLandNummern>"#;

/// A process result returned for one `EricMtBearbeiteVorgang` call.
#[derive(Debug, Clone)]
pub struct Scripted {
    pub res: i32,
    pub eric_response: String,
    pub server_response: String,
}

impl Scripted {
    pub fn ok(server_response: &str) -> Self {
        Self {
            res: 0,
            eric_response: "<EricBearbeiteVorgang><Erfolg/></EricBearbeiteVorgang>".into(),
            server_response: server_response.into(),
        }
    }

    pub fn failing(res: i32, eric_response: &str, server_response: &str) -> Self {
        Self {
            res,
            eric_response: eric_response.into(),
            server_response: server_response.into(),
        }
    }
}

/// One recorded `EricMtBearbeiteVorgang` call.
#[derive(Debug, Clone)]
pub struct ProcessCall {
    pub xml: String,
    pub datenart_version: String,
    pub flags: u32,
    pub abruf_code: Option<String>,
    pub has_transfer_handle: bool,
    pub has_crypt_params: bool,
    pub pdf_name: Option<String>,
}

#[derive(Debug, Default)]
pub struct MockState {
    next_handle: usize,
    buffers: HashMap<usize, Vec<u8>>,
    pub instances_created: usize,
    pub instances_freed: usize,
    pub buffers_created: usize,
    pub buffers_freed: usize,
    pub certs_opened: usize,
    pub certs_closed: usize,
    pub process_calls: Vec<ProcessCall>,
    pub testmerkers: Vec<String>,
    pub decoded: Vec<String>,
    pub script: VecDeque<Scripted>,
    /// Decryption results by encrypted input; unknown input fails.
    pub decryptions: HashMap<String, String>,
    pub ndh_err_xml: String,
    pub cert_properties: String,
    pub fail_instance_create: bool,
    /// Fail `buffer_create` once this many buffers exist.
    pub buffer_limit: Option<usize>,
    pub fail_buffer_free: bool,
    pub fail_cert_handle: bool,
    /// Return malformed XML from `EricMtCreateTH`.
    pub broken_th: bool,
}

#[derive(Debug, Default)]
pub struct MockEric {
    pub state: RefCell<MockState>,
}

static INIT_LOGGER: Once = Once::new();

/// Route the crate's tracing output to the test harness. Filter with `RUST_LOG`.
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .try_init();
    });
}

impl MockEric {
    pub fn new() -> Self {
        init_logger();
        Self::default()
    }

    pub fn script(self, result: Scripted) -> Self {
        self.state.borrow_mut().script.push_back(result);
        self
    }

    pub fn decrypts(self, encrypted: &str, decrypted: &str) -> Self {
        self.state
            .borrow_mut()
            .decryptions
            .insert(encrypted.to_string(), decrypted.to_string());
        self
    }

    pub fn with_state(self, f: impl FnOnce(&mut MockState)) -> Self {
        f(&mut self.state.borrow_mut());
        self
    }

    pub fn state(&self) -> std::cell::Ref<'_, MockState> {
        self.state.borrow()
    }

    /// Every created instance, buffer and certificate handle was released.
    pub fn assert_balanced(&self) {
        let state = self.state.borrow();
        assert_eq!(state.instances_created, state.instances_freed, "instances leaked");
        assert_eq!(state.buffers_created, state.buffers_freed, "buffers leaked");
        assert_eq!(state.certs_opened, state.certs_closed, "certificate handles leaked");
    }

    fn write(&self, buffer: BufferHandle, content: impl Into<Vec<u8>>) {
        self.state
            .borrow_mut()
            .buffers
            .insert(buffer.as_raw(), content.into());
    }
}

fn text(value: &CStr) -> String {
    value.to_string_lossy().into_owned()
}

/// Insert a TransferHeader right after the opening `<Elster ...>` tag.
fn insert_transfer_header(xml: &str, args: &TransferHeaderArgs<'_>) -> String {
    let header = format!(
        "<TransferHeader version=\"11\"><Verfahren>{}</Verfahren><DatenArt>{}</DatenArt><Vorgang>{}</Vorgang>{}<HerstellerID>{}</HerstellerID><DatenLieferant>{}</DatenLieferant><VersionClient>{}</VersionClient></TransferHeader>",
        text(args.verfahren),
        text(args.datenart),
        text(args.vorgang),
        match text(args.testmerker) {
            t if t.is_empty() => String::new(),
            t => format!("<Testmerker>{t}</Testmerker>"),
        },
        text(args.hersteller_id),
        text(args.daten_lieferant),
        text(args.version_client),
    );
    let start = xml.find("<Elster").unwrap_or(0);
    let end = xml[start..].find('>').map_or(0, |i| start + i + 1);
    format!("{}{}{}", &xml[..end], header, &xml[end..])
}

impl EricBindings for MockEric {
    fn instance_create(&self, _plugin_path: Option<&CStr>, _log_path: Option<&CStr>) -> Option<InstanceHandle> {
        let mut state = self.state.borrow_mut();
        if state.fail_instance_create {
            return None;
        }
        state.next_handle += 1;
        state.instances_created += 1;
        Some(InstanceHandle::from_raw(1000 + state.next_handle))
    }

    fn instance_free(&self, _instance: InstanceHandle) -> i32 {
        self.state.borrow_mut().instances_freed += 1;
        0
    }

    fn buffer_create(&self, _instance: InstanceHandle) -> Option<BufferHandle> {
        let mut state = self.state.borrow_mut();
        if state.buffer_limit.is_some_and(|limit| state.buffers.len() >= limit) {
            return None;
        }
        state.next_handle += 1;
        state.buffers_created += 1;
        let handle = state.next_handle;
        state.buffers.insert(handle, Vec::new());
        Some(BufferHandle::from_raw(handle))
    }

    fn buffer_content(&self, _instance: InstanceHandle, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer.as_raw()).cloned()
    }

    fn buffer_free(&self, _instance: InstanceHandle, buffer: BufferHandle) -> i32 {
        let mut state = self.state.borrow_mut();
        if state.buffers.remove(&buffer.as_raw()).is_none() {
            return GLOBAL_UNKNOWN;
        }
        state.buffers_freed += 1;
        if state.fail_buffer_free { GLOBAL_UNKNOWN } else { 0 }
    }

    fn get_handle_to_certificate(&self, _instance: InstanceHandle, cert: &mut CertHandle, _path: &CStr) -> i32 {
        let mut state = self.state.borrow_mut();
        if state.fail_cert_handle {
            return CRYPT_CREATE_KEY;
        }
        state.certs_opened += 1;
        *cert = CertHandle::from_raw(7);
        0
    }

    fn close_handle_to_certificate(&self, _instance: InstanceHandle, _cert: CertHandle) -> i32 {
        self.state.borrow_mut().certs_closed += 1;
        0
    }

    fn get_cert_properties(
        &self,
        _instance: InstanceHandle,
        _cert: CertHandle,
        _pin: &CStr,
        buffer: BufferHandle,
    ) -> i32 {
        let properties = self.state.borrow().cert_properties.clone();
        self.write(buffer, properties);
        0
    }

    fn process(
        &self,
        _instance: InstanceHandle,
        args: &ProcessArgs<'_>,
        transfer_handle: Option<&mut u32>,
        eric_buffer: BufferHandle,
        server_buffer: BufferHandle,
    ) -> i32 {
        let pdf_name = args.print_params.and_then(|p| p.pdf_name).map(text);
        if args.flags & ERIC_DRUCKE != 0 {
            if let Some(name) = &pdf_name {
                std::fs::write(name, MOCK_PDF).unwrap();
            }
        }
        let scripted = {
            let mut state = self.state.borrow_mut();
            state.process_calls.push(ProcessCall {
                xml: text(args.xml),
                datenart_version: text(args.datenart_version),
                flags: args.flags,
                abruf_code: args.crypt_params.and_then(|c| c.abruf_code).map(text),
                has_transfer_handle: transfer_handle.is_some(),
                has_crypt_params: args.crypt_params.is_some(),
                pdf_name,
            });
            state.script.pop_front().unwrap_or_else(|| Scripted::ok(""))
        };
        self.write(eric_buffer, scripted.eric_response);
        self.write(server_buffer, scripted.server_response);
        scripted.res
    }

    fn create_th(&self, _instance: InstanceHandle, xml: &CStr, args: &TransferHeaderArgs<'_>, buffer: BufferHandle) -> i32 {
        let broken = {
            let mut state = self.state.borrow_mut();
            state.testmerkers.push(text(args.testmerker));
            state.broken_th
        };
        let content = if broken {
            "<Elster><TransferHeader>".to_string()
        } else {
            insert_transfer_header(&text(xml), args)
        };
        self.write(buffer, content);
        0
    }

    fn decode_data(
        &self,
        _instance: InstanceHandle,
        _cert: CertHandle,
        _pin: &CStr,
        data: &CStr,
        buffer: BufferHandle,
    ) -> i32 {
        let data = text(data);
        let decrypted = {
            let mut state = self.state.borrow_mut();
            state.decoded.push(data.clone());
            state.decryptions.get(&data).cloned()
        };
        match decrypted {
            Some(xml) => {
                self.write(buffer, xml);
                0
            }
            None => CRYPT_CREATE_KEY,
        }
    }

    fn get_error_messages_from_xml_answer(
        &self,
        _instance: InstanceHandle,
        _xml: &CStr,
        buffers: [BufferHandle; 4],
    ) -> i32 {
        let ndh_err_xml = self.state.borrow().ndh_err_xml.clone();
        let [ticket, th_res_code, th_err_msg, ndh] = buffers;
        self.write(ticket, "et-mock");
        self.write(th_res_code, "0");
        self.write(th_err_msg, "");
        self.write(ndh, ndh_err_xml);
        0
    }

    fn get_tax_offices(&self, _instance: InstanceHandle, state_id: &CStr, buffer: BufferHandle) -> i32 {
        let id = text(state_id);
        let xml = format!(
            "<EricHoleFinanzaemter xmlns=\"http://www.elster.de/EricXML/1.0/EricHoleFinanzaemter\"><Finanzamt><BuFaNummer>{id}01</BuFaNummer><Name>Finanzamt {id} Mitte</Name></Finanzamt><Finanzamt><BuFaNummer>{id}02</BuFaNummer><Name>Finanzamt {id} Nord</Name></Finanzamt></EricHoleFinanzaemter>"
        );
        self.write(buffer, xml);
        0
    }

    fn get_state_id_list(&self, _instance: InstanceHandle, buffer: BufferHandle) -> i32 {
        self.write(buffer, STATE_LIST_XML);
        0
    }
}
