//! ERiC result codes.
//!
//! Every native call returns an `i32` result code; zero is success. The
//! codes are grouped in ranges (global, transfer, crypt, IO, print) which
//! decide how a failure is classified.

pub const ERIC_OK: i32 = 0;

pub const ERIC_GLOBAL_PRUEF_FEHLER: i32 = 610001002;
pub const ERIC_TRANSFER_ERR_XML_THEADER: i32 = 610101210;
pub const ERIC_TRANSFER_ERR_XML_NHEADER: i32 = 610101292;

/// Codes that do not come from ERiC but are reported alongside its codes.
pub const CUSTOM_CODES: &[(i32, &str)] = &[
    (1, "NULL_POINTER_RETURNED"),
    (2, "NO_MATCHING_IDENTIFIER_FOR_UNLOCK_REQUEST"),
    (3, "ALREADY_OPEN_UNLOCK_CODE_REQUEST"),
    (5, "ELSTER_REQUEST_ID_UNKNOWN"),
    (6, "INVALID_BUFA_NUMBER"),
];

/// Result codes for which the server response carries an error message.
pub const SERVER_ERROR_CODES: [i32; 2] = [ERIC_TRANSFER_ERR_XML_THEADER, ERIC_TRANSFER_ERR_XML_NHEADER];

pub const GLOBAL_VALIDATION_ERRORS: &[(i32, &str)] = &[(ERIC_GLOBAL_PRUEF_FEHLER, "ERIC_GLOBAL_PRUEF_FEHLER")];

pub const GLOBAL_INITIALISATION_ERRORS: &[(i32, &str)] = &[
    (610001081, "ERIC_GLOBAL_NICHT_INITIALISIERT"),
    (610001082, "ERIC_GLOBAL_MEHRFACHE_INITIALISIERUNG"),
    (610001083, "ERIC_GLOBAL_FEHLER_INITIALISIERUNG"),
];

/// Global errors other than validation and initialisation failures.
pub const GLOBAL_ERRORS: &[(i32, &str)] = &[
    (610001001, "ERIC_GLOBAL_UNKNOWN"),
    (610001003, "ERIC_GLOBAL_HINWEISE"),
    (610001007, "ERIC_GLOBAL_FEHLERMELDUNG_NICHT_VORHANDEN"),
    (610001008, "ERIC_GLOBAL_KEINE_DATEN_VORHANDEN"),
    (610001013, "ERIC_GLOBAL_NICHT_GENUEGEND_ARBEITSSPEICHER"),
    (610001014, "ERIC_GLOBAL_DATEI_NICHT_GEFUNDEN"),
    (610001016, "ERIC_GLOBAL_HERSTELLER_ID_NICHT_ERLAUBT"),
    (610001017, "ERIC_GLOBAL_ILLEGAL_STATE"),
    (610001018, "ERIC_GLOBAL_FUNKTION_NICHT_ERLAUBT"),
    (610001019, "ERIC_GLOBAL_ECHTFALL_NICHT_ERLAUBT"),
    (610001020, "ERIC_GLOBAL_NO_VERSAND_IN_BETA_VERSION"),
    (610001025, "ERIC_GLOBAL_TESTMERKER_UNGUELTIG"),
    (610001026, "ERIC_GLOBAL_DATENSATZ_ZU_GROSS"),
    (610001027, "ERIC_GLOBAL_VERSCHLUESSELUNGS_PARAMETER_NICHT_ERLAUBT"),
    (610001028, "ERIC_GLOBAL_NUR_PORTALZERTIFIKAT_ERLAUBT"),
    (610001029, "ERIC_GLOBAL_ABRUFCODE_NICHT_ERLAUBT"),
    (610001030, "ERIC_GLOBAL_ERROR_XML_CREATE"),
    (610001031, "ERIC_GLOBAL_TEXTPUFFERGROESSE_FIX"),
    (610001032, "ERIC_GLOBAL_INTERNER_FEHLER"),
    (610001033, "ERIC_GLOBAL_ARITHMETIKFEHLER"),
    (610001034, "ERIC_GLOBAL_STEUERNUMMER_UNGUELTIG"),
    (610001035, "ERIC_GLOBAL_STEUERNUMMER_FALSCHE_LAENGE"),
    (610001036, "ERIC_GLOBAL_STEUERNUMMER_NICHT_NUMERISCH"),
    (610001037, "ERIC_GLOBAL_LANDESNUMMER_UNBEKANNT"),
    (610001038, "ERIC_GLOBAL_BUFANR_UNBEKANNT"),
    (610001039, "ERIC_GLOBAL_LANDESNUMMER_BUFANR"),
    (610001040, "ERIC_GLOBAL_PUFFER_ZUGRIFFSKONFLIKT"),
    (610001041, "ERIC_GLOBAL_PUFFER_UEBERLAUF"),
    (610001042, "ERIC_GLOBAL_DATENARTVERSION_UNBEKANNT"),
    (610001044, "ERIC_GLOBAL_DATENARTVERSION_XML_INKONSISTENT"),
    (610001045, "ERIC_GLOBAL_COMMONDATA_NICHT_VERFUEGBAR"),
    (610001046, "ERIC_GLOBAL_LOG_EXCEPTION"),
    (610001047, "ERIC_GLOBAL_TRANSPORTSCHLUESSEL_NICHT_ERLAUBT"),
    (610001048, "ERIC_GLOBAL_OEFFENTLICHER_SCHLUESSEL_UNGUELTIG"),
    (610001049, "ERIC_GLOBAL_TRANSPORTSCHLUESSEL_TYP_FALSCH"),
    (610001050, "ERIC_GLOBAL_PUFFER_UNGLEICHER_INSTANZ"),
    (610001051, "ERIC_GLOBAL_VORSATZ_UNGUELTIG"),
    (610001053, "ERIC_GLOBAL_DATEIZUGRIFF_VERWEIGERT"),
    (610001080, "ERIC_GLOBAL_UNGUELTIGE_INSTANZ"),
    (610001102, "ERIC_GLOBAL_UNKNOWN_PARAMETER_ERROR"),
    (610001108, "ERIC_GLOBAL_CHECK_CORRUPTED_NDS"),
    (610001206, "ERIC_GLOBAL_VERSCHLUESSELUNGS_PARAMETER_NICHT_ANGEGEBEN"),
    (610001209, "ERIC_GLOBAL_SEND_FLAG_MEHR_ALS_EINES"),
    (610001218, "ERIC_GLOBAL_UNGUELTIGE_FLAG_KOMBINATION"),
    (610001220, "ERIC_GLOBAL_ERSTE_SEITE_DRUCK_NICHT_UNTERSTUETZT"),
    (610001222, "ERIC_GLOBAL_UNGUELTIGER_PARAMETER"),
    (610001224, "ERIC_GLOBAL_DRUCK_FUER_VERFAHREN_NICHT_ERLAUBT"),
    (610001225, "ERIC_GLOBAL_VERSAND_ART_NICHT_UNTERSTUETZT"),
    (610001226, "ERIC_GLOBAL_UNGUELTIGE_PARAMETER_VERSION"),
    (610001227, "ERIC_GLOBAL_TRANSFERHANDLE"),
    (610001228, "ERIC_GLOBAL_PLUGININITIALISIERUNG"),
    (610001229, "ERIC_GLOBAL_INKOMPATIBLE_VERSIONEN"),
    (610001230, "ERIC_GLOBAL_VERSCHLUESSELUNGSVERFAHREN_NICHT_UNTERSTUETZT"),
    (610001231, "ERIC_GLOBAL_MEHRFACHAUFRUFE_NICHT_UNTERSTUETZT"),
    (610001404, "ERIC_GLOBAL_UTI_COUNTRY_NOT_SUPPORTED"),
    (610001501, "ERIC_GLOBAL_IBAN_FORMALER_FEHLER"),
    (610001502, "ERIC_GLOBAL_IBAN_LAENDERCODE_FEHLER"),
    (610001503, "ERIC_GLOBAL_IBAN_LANDESFORMAT_FEHLER"),
    (610001504, "ERIC_GLOBAL_IBAN_PRUEFZIFFER_FEHLER"),
    (610001510, "ERIC_GLOBAL_BIC_FORMALER_FEHLER"),
    (610001511, "ERIC_GLOBAL_BIC_LAENDERCODE_FEHLER"),
    (610001519, "ERIC_GLOBAL_ZULASSUNGSNUMMER_ZU_LANG"),
    (610001525, "ERIC_GLOBAL_IDNUMMER_UNGUELTIG"),
    (610001526, "ERIC_GLOBAL_NULL_PARAMETER"),
    (610001851, "ERIC_GLOBAL_UPDATE_NECESSARY"),
    (610001860, "ERIC_GLOBAL_EINSTELLUNG_NAME_UNGUELTIG"),
    (610001861, "ERIC_GLOBAL_EINSTELLUNG_WERT_UNGUELTIG"),
    (610001862, "ERIC_GLOBAL_ERR_DEKODIEREN"),
    (610001863, "ERIC_GLOBAL_FUNKTION_NICHT_UNTERSTUETZT"),
    (610001865, "ERIC_GLOBAL_NUTZDATENTICKETS_NICHT_EINDEUTIG"),
    (610001866, "ERIC_GLOBAL_NUTZDATENHEADERVERSIONEN_UNEINHEITLICH"),
    (610001867, "ERIC_GLOBAL_BUNDESLAENDER_UNEINHEITLICH"),
    (610001868, "ERIC_GLOBAL_ZEITRAEUME_UNEINHEITLICH"),
    (610001869, "ERIC_GLOBAL_NUTZDATENHEADER_EMPFAENGER_NICHT_KORREKT"),
];

pub const TRANSFER_ERRORS: &[(i32, &str)] = &[
    (610101200, "ERIC_TRANSFER_COM_ERROR"),
    (610101201, "ERIC_TRANSFER_VORGANG_NICHT_UNTERSTUETZT"),
    (610101210, "ERIC_TRANSFER_ERR_XML_THEADER"),
    (610101251, "ERIC_TRANSFER_ERR_PARAM"),
    (610101253, "ERIC_TRANSFER_ERR_DATENTEILENDNOTFOUND"),
    (610101255, "ERIC_TRANSFER_ERR_BEGINDATENLIEFERANT"),
    (610101256, "ERIC_TRANSFER_ERR_ENDDATENLIEFERANT"),
    (610101257, "ERIC_TRANSFER_ERR_BEGINTRANSPORTSCHLUESSEL"),
    (610101258, "ERIC_TRANSFER_ERR_ENDTRANSPORTSCHLUESSEL"),
    (610101259, "ERIC_TRANSFER_ERR_BEGINDATENGROESSE"),
    (610101260, "ERIC_TRANSFER_ERR_ENDDATENGROESSE"),
    (610101271, "ERIC_TRANSFER_ERR_SEND"),
    (610101274, "ERIC_TRANSFER_ERR_NOTENCRYPTED"),
    (610101276, "ERIC_TRANSFER_ERR_PROXYCONNECT"),
    (610101278, "ERIC_TRANSFER_ERR_CONNECTSERVER"),
    (610101279, "ERIC_TRANSFER_ERR_NORESPONSE"),
    (610101280, "ERIC_TRANSFER_ERR_PROXYAUTH"),
    (610101282, "ERIC_TRANSFER_ERR_SEND_INIT"),
    (610101283, "ERIC_TRANSFER_ERR_TIMEOUT"),
    (610101284, "ERIC_TRANSFER_ERR_PROXYPORT_INVALID"),
    (610101291, "ERIC_TRANSFER_ERR_OTHER"),
    (610101292, "ERIC_TRANSFER_ERR_XML_NHEADER"),
    (610101293, "ERIC_TRANSFER_ERR_XML_ENCODING"),
    (610101294, "ERIC_TRANSFER_ERR_ENDSIGUSER"),
    (610101295, "ERIC_TRANSFER_ERR_XMLTAG_NICHT_GEFUNDEN"),
    (610101297, "ERIC_TRANSFER_ERR_DATENTEILFEHLER"),
    (610101500, "ERIC_TRANSFER_EID_ZERTIFIKATFEHLER"),
    (610101510, "ERIC_TRANSFER_EID_KEINKONTO"),
    (610101511, "ERIC_TRANSFER_EID_IDNRNICHTEINDEUTIG"),
    (610101512, "ERIC_TRANSFER_EID_SERVERFEHLER"),
    (610101520, "ERIC_TRANSFER_EID_KEINCLIENT"),
    (610101521, "ERIC_TRANSFER_EID_CLIENTFEHLER"),
    (610101522, "ERIC_TRANSFER_EID_FEHLENDEFELDER"),
    (610101523, "ERIC_TRANSFER_EID_IDENTIFIKATIONABGEBROCHEN"),
    (610101524, "ERIC_TRANSFER_EID_NPABLOCKIERT"),
];

pub const CRYPT_ERRORS: &[(i32, &str)] = &[
    (610201016, "ERIC_CRYPT_ERROR_CREATE_KEY"),
    (610201101, "ERIC_CRYPT_E_INVALID_HANDLE"),
    (610201102, "ERIC_CRYPT_E_MAX_SESSION"),
    (610201103, "ERIC_CRYPT_E_BUSY"),
    (610201104, "ERIC_CRYPT_E_OUT_OF_MEM"),
    (610201105, "ERIC_CRYPT_E_PSE_PATH"),
    (610201106, "ERIC_CRYPT_E_PIN_WRONG"),
    (610201107, "ERIC_CRYPT_E_PIN_LOCKED"),
    (610201108, "ERIC_CRYPT_E_P7_READ"),
    (610201109, "ERIC_CRYPT_E_P7_DECODE"),
    (610201110, "ERIC_CRYPT_E_P7_RECIPIENT"),
    (610201111, "ERIC_CRYPT_E_P12_READ"),
    (610201112, "ERIC_CRYPT_E_P12_DECODE"),
    (610201113, "ERIC_CRYPT_E_P12_SIG_KEY"),
    (610201114, "ERIC_CRYPT_E_P12_ENC_KEY"),
    (610201115, "ERIC_CRYPT_E_P11_SIG_KEY"),
    (610201116, "ERIC_CRYPT_E_P11_ENC_KEY"),
    (610201117, "ERIC_CRYPT_E_XML_PARSE"),
    (610201118, "ERIC_CRYPT_E_XML_SIG_ADD"),
    (610201119, "ERIC_CRYPT_E_XML_SIG_TAG"),
    (610201120, "ERIC_CRYPT_E_XML_SIG_SIGN"),
    (610201121, "ERIC_CRYPT_E_ENCODE_UNKNOWN"),
    (610201122, "ERIC_CRYPT_E_ENCODE_ERROR"),
    (610201123, "ERIC_CRYPT_E_XML_INIT"),
    (610201124, "ERIC_CRYPT_E_ENCRYPT"),
    (610201125, "ERIC_CRYPT_E_DECRYPT"),
    (610201126, "ERIC_CRYPT_E_P11_SLOT_EMPTY"),
    (610201127, "ERIC_CRYPT_E_NO_SIG_ENC_KEY"),
    (610201128, "ERIC_CRYPT_E_LOAD_DLL"),
    (610201129, "ERIC_CRYPT_E_NO_SERVICE"),
    (610201130, "ERIC_CRYPT_E_ESICL_EXCEPTION"),
    (610201144, "ERIC_CRYPT_E_TOKEN_TYPE_MISMATCH"),
    (610201146, "ERIC_CRYPT_E_P12_CREATE"),
    (610201147, "ERIC_CRYPT_E_VERIFY_CERT_CHAIN"),
    (610201148, "ERIC_CRYPT_E_P11_ENGINE_LOADED"),
    (610201149, "ERIC_CRYPT_E_USER_CANCEL"),
    (610201200, "ERIC_CRYPT_ZERTIFIKAT"),
    (610201201, "ERIC_CRYPT_SIGNATUR"),
    (610201203, "ERIC_CRYPT_NICHT_UNTERSTUETZTES_PSE_FORMAT"),
    (610201205, "ERIC_CRYPT_PIN_BENOETIGT"),
    (610201206, "ERIC_CRYPT_PIN_STAERKE_NICHT_AUSREICHEND"),
    (610201208, "ERIC_CRYPT_E_INTERN"),
    (610201209, "ERIC_CRYPT_ZERTIFIKATSPFAD_KEIN_VERZEICHNIS"),
    (610201210, "ERIC_CRYPT_ZERTIFIKATSDATEI_EXISTIERT_BEREITS"),
    (610201211, "ERIC_CRYPT_PIN_ENTHAELT_UNGUELTIGE_ZEICHEN"),
    (610201212, "ERIC_CRYPT_E_INVALID_PARAM_ABC"),
    (610201213, "ERIC_CRYPT_CORRUPTED"),
    (610201214, "ERIC_CRYPT_EIDKARTE_NICHT_UNTERSTUETZT"),
    (610201215, "ERIC_CRYPT_E_SC_SLOT_EMPTY"),
    (610201216, "ERIC_CRYPT_E_SC_NO_APPLET"),
    (610201217, "ERIC_CRYPT_E_SC_SESSION"),
    (610201218, "ERIC_CRYPT_E_P11_NO_SIG_CERT"),
    (610201219, "ERIC_CRYPT_E_P11_INIT_FAILED"),
    (610201220, "ERIC_CRYPT_E_P11_NO_ENC_CERT"),
    (610201221, "ERIC_CRYPT_E_P12_NO_SIG_CERT"),
    (610201222, "ERIC_CRYPT_E_P12_NO_ENC_CERT"),
    (610201223, "ERIC_CRYPT_E_SC_ENC_KEY"),
    (610201224, "ERIC_CRYPT_E_SC_NO_SIG_CERT"),
    (610201225, "ERIC_CRYPT_E_SC_NO_ENC_CERT"),
    (610201226, "ERIC_CRYPT_E_SC_INIT_FAILED"),
    (610201227, "ERIC_CRYPT_E_SC_SIG_KEY"),
];

pub const IO_ERRORS: &[(i32, &str)] = &[
    (610301001, "ERIC_IO_FEHLER"),
    (610301005, "ERIC_IO_DATEI_INKORREKT"),
    (610301006, "ERIC_IO_PARSE_FEHLER"),
    (610301007, "ERIC_IO_NDS_GENERIERUNG_FEHLGESCHLAGEN"),
    (610301010, "ERIC_IO_MASTERDATENSERVICE_NICHT_VERFUEGBAR"),
    (610301014, "ERIC_IO_STEUERZEICHEN_IM_NDS"),
    (610301031, "ERIC_IO_VERSIONSINFORMATIONEN_NICHT_GEFUNDEN"),
    (610301104, "ERIC_IO_FALSCHES_VERFAHREN"),
    (610301105, "ERIC_IO_READER_MEHRFACHE_STEUERFAELLE"),
    (610301106, "ERIC_IO_READER_UNERWARTETE_ELEMENTE"),
    (610301107, "ERIC_IO_READER_FORMALE_FEHLER"),
    (610301108, "ERIC_IO_READER_FALSCHES_ENCODING"),
    (610301109, "ERIC_IO_READER_MEHRFACHE_NUTZDATEN_ELEMENTE"),
    (610301110, "ERIC_IO_READER_MEHRFACHE_NUTZDATENBLOCK_ELEMENTE"),
    (610301111, "ERIC_IO_UNBEKANNTE_DATENART"),
    (610301114, "ERIC_IO_READER_UNTERSACHBEREICH_UNGUELTIG"),
    (610301115, "ERIC_IO_READER_ZU_VIELE_NUTZDATENBLOCK_ELEMENTE"),
    (610301150, "ERIC_IO_READER_STEUERZEICHEN_IM_TRANSFERHEADER"),
    (610301151, "ERIC_IO_READER_STEUERZEICHEN_IM_NUTZDATENHEADER"),
    (610301152, "ERIC_IO_READER_STEUERZEICHEN_IN_DEN_NUTZDATEN"),
    (610301200, "ERIC_IO_READER_SCHEMA_VALIDIERUNGSFEHLER"),
    (610301201, "ERIC_IO_READER_UNBEKANNTE_XML_ENTITY"),
    (610301252, "ERIC_IO_DATENTEILNOTFOUND"),
    (610301253, "ERIC_IO_DATENTEILENDNOTFOUND"),
    (610301300, "ERIC_IO_UEBERGABEPARAMETER_FEHLERHAFT"),
    (610301400, "ERIC_IO_UNGUELTIGE_UTF8_SEQUENZ"),
    (610301401, "ERIC_IO_UNGUELTIGE_ZEICHEN_IN_PARAMETER"),
];

pub const PRINT_ERRORS: &[(i32, &str)] = &[
    (610501001, "ERIC_PRINT_INTERNER_FEHLER"),
    (610501002, "ERIC_PRINT_DRUCKVORLAGE_NICHT_GEFUNDEN"),
    (610501004, "ERIC_PRINT_UNGUELTIGER_DATEI_PFAD"),
    (610501007, "ERIC_PRINT_INITIALISIERUNG_FEHLERHAFT"),
    (610501008, "ERIC_PRINT_AUSGABEZIEL_UNBEKANNT"),
    (610501009, "ERIC_PRINT_ABBRUCH_DRUCKVORBEREITUNG"),
    (610501010, "ERIC_PRINT_ABBRUCH_GENERIERUNG"),
    (610501011, "ERIC_PRINT_STEUERFALL_NICHT_UNTERSTUETZT"),
    (610501012, "ERIC_PRINT_FUSSTEXT_ZU_LANG"),
];

/// Range a result code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCategory {
    Success,
    GlobalValidation,
    GlobalInitialisation,
    Global,
    Transfer,
    Crypt,
    Io,
    Print,
    Unknown,
}

fn contains(table: &[(i32, &str)], code: i32) -> bool {
    table.iter().any(|(c, _)| *c == code)
}

impl ResultCategory {
    pub fn of(code: i32) -> Self {
        if code == ERIC_OK {
            ResultCategory::Success
        } else if contains(GLOBAL_VALIDATION_ERRORS, code) {
            ResultCategory::GlobalValidation
        } else if contains(GLOBAL_INITIALISATION_ERRORS, code) {
            ResultCategory::GlobalInitialisation
        } else if contains(GLOBAL_ERRORS, code) {
            ResultCategory::Global
        } else if contains(TRANSFER_ERRORS, code) {
            ResultCategory::Transfer
        } else if contains(CRYPT_ERRORS, code) {
            ResultCategory::Crypt
        } else if contains(IO_ERRORS, code) {
            ResultCategory::Io
        } else if contains(PRINT_ERRORS, code) {
            ResultCategory::Print
        } else {
            ResultCategory::Unknown
        }
    }
}

/// Symbolic name of a result code, or "Unknown error message".
pub fn result_code_name(code: i32) -> &'static str {
    if code == ERIC_OK {
        return "ERIC_OK";
    }
    [
        CUSTOM_CODES,
        GLOBAL_VALIDATION_ERRORS,
        GLOBAL_INITIALISATION_ERRORS,
        GLOBAL_ERRORS,
        TRANSFER_ERRORS,
        CRYPT_ERRORS,
        IO_ERRORS,
        PRINT_ERRORS,
    ]
    .iter()
    .flat_map(|table| table.iter())
    .find(|(c, _)| *c == code)
    .map_or("Unknown error message", |(_, name)| *name)
}
