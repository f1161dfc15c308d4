use crate::core::{ElsterError, ValidationError};

use super::input::{EstData, FormDataEst};
use super::mapping::religion_code;
use super::steuernummer::is_valid_bufa;

/// Validate a declaration request.
///
/// All rule violations are reported together as
/// [`ElsterError::InvalidInput`]. A structurally correct but unknown BuFa
/// number for a first-time filer is reported as
/// [`ElsterError::InvalidBufaNumber`].
pub fn validate_est_data(data: &EstData, accept_test_bufa: bool) -> Result<(), ElsterError> {
    let mut errors = validate_form_data(&data.est_data);

    if !data.meta_data.is_digitally_signed {
        errors.push(ValidationError::new("is_digitally_signed", "must be set true"));
    }

    if !errors.is_empty() {
        return Err(ElsterError::InvalidInput(errors));
    }

    if data.est_data.submission_without_tax_nr == Some(true) {
        let bufa = data.est_data.bufa_nr.as_deref().unwrap_or_default();
        if !is_valid_bufa(bufa, accept_test_bufa) {
            return Err(ElsterError::InvalidBufaNumber(bufa.to_string()));
        }
    }
    Ok(())
}

/// Check the form data rules. Returns all violations found.
pub fn validate_form_data(form: &FormDataEst) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let has_tax_number = form.steuernummer.as_deref().is_some_and(|s| !s.is_empty());
    let new_admission = form.submission_without_tax_nr == Some(true);

    if has_tax_number && new_admission {
        errors.push(ValidationError::new(
            "submission_without_tax_nr",
            "can not be a new admission if tax number given",
        ));
    }
    if !has_tax_number && !new_admission {
        errors.push(ValidationError::new(
            "submission_without_tax_nr",
            "must be new admission if no tax number given",
        ));
    }

    if let Some(stnr) = form.steuernummer.as_deref().filter(|s| !s.is_empty()) {
        if !(10..=11).contains(&stnr.len()) {
            errors.push(ValidationError::new("steuernummer", "must be 10 or 11 numbers long"));
        }
    }

    if new_admission && form.bufa_nr.as_deref().is_none_or(|b| b.len() != 4) {
        errors.push(ValidationError::new(
            "bufa_nr",
            "must be 4 numbers long for new admission",
        ));
    }

    if form.familienstand_married_lived_separated == Some(true)
        && form.familienstand_married_lived_separated_since.is_none()
    {
        errors.push(ValidationError::new(
            "familienstand_married_lived_separated_since",
            "must be set if familienstand_married_lived_separated set",
        ));
    }
    if form.familienstand_widowed_lived_separated == Some(true)
        && form.familienstand_widowed_lived_separated_since.is_none()
    {
        errors.push(ValidationError::new(
            "familienstand_widowed_lived_separated_since",
            "must be set if familienstand_widowed_lived_separated set",
        ));
    }

    if religion_code(&form.person_a_religion).is_none() {
        errors.push(ValidationError::new(
            "person_a_religion",
            format!("unknown religion '{}'", form.person_a_religion),
        ));
    }
    if let Some(religion) = form.person_b_religion.as_deref().filter(|r| !r.is_empty()) {
        if religion_code(religion).is_none() {
            errors.push(ValidationError::new(
                "person_b_religion",
                format!("unknown religion '{religion}'"),
            ));
        }
    }

    errors
}
