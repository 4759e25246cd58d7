use crate::config::definition::FlowDefinition;
use crate::error::ConfigError;

const BUILTIN: &[(&str, &str)] = &[
    ("cnpj_change", include_str!("flows/cnpj_change.yaml")),
    ("company_approval", include_str!("flows/company_approval.yaml")),
    ("supplier_onboarding", include_str!("flows/supplier_onboarding.yaml")),
];

pub fn builtin_ids() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(|(id, _)| *id)
}

pub fn builtin(id: &str) -> Result<FlowDefinition, ConfigError> {
    let (_, source) = BUILTIN
        .iter()
        .find(|(candidate, _)| *candidate == id)
        .ok_or_else(|| ConfigError::UnknownFlow(id.to_string()))?;
    FlowDefinition::from_yaml(source)
}

pub fn all_builtin() -> Result<Vec<FlowDefinition>, ConfigError> {
    builtin_ids().map(builtin).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::attachment::Upload;
    use crate::collab::credentials::StaticCredentialValidator;
    use crate::collab::submission::RecordingSubmitter;
    use crate::context::FlowContext;
    use crate::core::value::Value;
    use crate::error::WizardError;
    use crate::state::session::{SessionError, WizardSession};

    #[test]
    fn every_builtin_compiles_with_matching_id() {
        for def in all_builtin().expect("builtin flows parse") {
            let wizard = def
                .compile(FlowContext::default())
                .expect("builtin flow compiles");
            assert!(!wizard.is_empty());
            assert!(builtin_ids().any(|id| id == wizard.id()));
            def.attachment_policy().expect("policy compiles");
        }
    }

    #[test]
    fn unknown_builtin() {
        assert!(matches!(builtin("payroll"), Err(ConfigError::UnknownFlow(_))));
    }

    #[test]
    fn cnpj_change_end_to_end() {
        let def = builtin("cnpj_change").expect("flow");
        let wizard = def
            .compile(FlowContext::new().with_company("Acme Ltda").with_user("ana"))
            .expect("compile");
        let policy = def.attachment_policy().expect("policy");
        let field = def.credential_field.clone().expect("credential field");
        let mut validator = StaticCredentialValidator::new("master-key");
        let mut session = WizardSession::new(&wizard);

        session
            .check_credential(&mut validator, &field, "master-key")
            .expect("open session");
        session.advance().expect("password");

        session.set("company_id", "42").expect("set");
        session.set("new_cnpj", "11.222.333/0001-82").expect("set");
        assert!(session.advance().is_err());
        session.set("new_cnpj", "11.222.333/0001-81").expect("set");
        session.advance().expect("company");

        session.retreat().expect("company is revisitable");
        session.advance().expect("company again");

        session
            .attach(
                "registry_document",
                &Upload::new("alteracao.pdf", "application/pdf", 4096),
                &policy,
            )
            .expect("pdf accepted");
        session.advance().expect("document");

        session.set("justification", "short").expect("set");
        assert!(session.advance().is_err());
        session
            .set("justification", "Company merged into the holding group")
            .expect("set");
        session.advance().expect("justification");

        let mut submitter = RecordingSubmitter::new();
        assert!(matches!(
            session.finish(&mut submitter),
            Err(SessionError::Wizard(WizardError::IncompleteWizard { .. }))
        ));
        session.set("confirmed", true).expect("set");
        let submission = session.finish(&mut submitter).expect("finish");

        assert_eq!(submission.flow, "cnpj_change");
        assert_eq!(submission.completed_steps.len(), 5);
        assert_eq!(submission.context.company.as_deref(), Some("Acme Ltda"));
        assert_eq!(submission.data.get("password_validated"), Some(&Value::Bool(true)));
    }
}
