use std::str::FromStr;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The contract form in progress. Never stored in the contract store directly:
/// issuing a contract freezes a copy of it.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ContractDraft {
    /// Who the contract is with
    pub client: ClientInfo,
    /// What the contract is about
    pub project: ProjectInfo,
    /// Selected services and their sub-options
    pub services: Services,
    /// Ordered project phases
    pub milestones: Vec<Milestone>,
    /// Amounts and net days
    pub payment: PaymentTerms,
    /// Which clauses appear in the rendered document
    pub included_sections: IncludedSections,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ClientInfo {
    pub name: String,
    pub company: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub email: String,
    pub phone: String,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ProjectInfo {
    pub name: String,
    pub description: String,
    /// Decimal string, shown as entered
    pub total_cost: String,
    pub contract_date: Option<Date>,
    pub contract_number: String,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PaymentTerms {
    pub deposit_amount: String,
    pub final_amount: String,
    pub maintenance_fee: String,
    pub hourly_rate: String,
    /// Net days for invoices
    pub payment_days: String,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Milestone {
    pub name: String,
    pub description: String,
    pub deliverable: String,
    pub due_date: Option<Date>,
    /// Share of the total cost, as a percentage string
    pub payment: String,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Services {
    pub website_design: bool,
    pub website_development: bool,
    pub website_maintenance: bool,
    pub design: DesignServices,
    pub development: DevelopmentServices,
    pub maintenance: MaintenanceServices,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DesignServices {
    pub uiux_consultation: bool,
    pub custom_mockups: bool,
    pub responsive_design: bool,
    pub brand_integration: bool,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DevelopmentServices {
    pub frontend: bool,
    pub backend: bool,
    pub cms_integration: bool,
    pub ecommerce: bool,
    pub database: bool,
    pub api: bool,
    pub third_party_integration: bool,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MaintenanceServices {
    pub regular_updates: bool,
    pub content_updates: bool,
    pub performance_monitoring: bool,
    pub backup_recovery: bool,
    pub technical_support: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct IncludedSections {
    pub project_overview: bool,
    pub timeline: bool,
    pub payment_terms: bool,
    pub client_responsibilities: bool,
    pub provider_responsibilities: bool,
    pub intellectual_property: bool,
    pub warranty: bool,
    pub termination: bool,
}

impl Default for IncludedSections {
    fn default() -> Self {
        Self {
            project_overview: true,
            timeline: true,
            payment_terms: true,
            client_responsibilities: true,
            provider_responsibilities: true,
            intellectual_property: true,
            warranty: true,
            termination: true,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

#[derive(Debug, Error, PartialEq)]
pub enum DraftFieldError {
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Invalid date '{0}': {1}")]
    InvalidDate(String, String),

    #[error("Milestone {0} does not exist")]
    MilestoneOutOfRange(usize),
}

impl ContractDraft {
    /// A fresh form with the defaults the dashboard starts from.
    pub fn seeded(today: Date) -> Self {
        let milestone = |name: &str, description: &str, deliverable: &str| Milestone {
            name: name.to_string(),
            description: description.to_string(),
            deliverable: deliverable.to_string(),
            due_date: None,
            payment: "25".to_string(),
        };

        Self {
            client: ClientInfo {
                state: "TX".to_string(),
                ..ClientInfo::default()
            },
            project: ProjectInfo {
                contract_date: Some(today),
                ..ProjectInfo::default()
            },
            milestones: vec![
                milestone(
                    "Project Kickoff",
                    "Initial consultation & requirements gathering",
                    "Project brief & wireframes",
                ),
                milestone(
                    "Design Phase",
                    "Visual design & client approval",
                    "Design mockups",
                ),
                milestone(
                    "Development Phase",
                    "Core functionality development",
                    "Beta version",
                ),
                milestone(
                    "Launch & Delivery",
                    "Final testing, launch, training",
                    "Live website & documentation",
                ),
            ],
            payment: PaymentTerms {
                payment_days: "30".to_string(),
                ..PaymentTerms::default()
            },
            ..ContractDraft::default()
        }
    }

    /// Client name and project name must be present before a contract is issued.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if self.client.name.trim().is_empty() {
            missing.push("client name");
        }
        if self.project.name.trim().is_empty() {
            missing.push("project name");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields(missing))
        }
    }

    pub fn set_text(&mut self, field: TextField, value: &str) -> Result<(), DraftFieldError> {
        let value = value.to_string();
        match field {
            TextField::ClientName => self.client.name = value,
            TextField::ClientCompany => self.client.company = value,
            TextField::ClientAddress => self.client.address = value,
            TextField::ClientCity => self.client.city = value,
            TextField::ClientState => self.client.state = value,
            TextField::ClientZip => self.client.zip = value,
            TextField::ClientEmail => self.client.email = value,
            TextField::ClientPhone => self.client.phone = value,
            TextField::ProjectName => self.project.name = value,
            TextField::ProjectDescription => self.project.description = value,
            TextField::TotalCost => self.project.total_cost = value,
            TextField::ContractNumber => self.project.contract_number = value,
            TextField::ContractDate => self.project.contract_date = parse_optional_date(&value)?,
            TextField::DepositAmount => self.payment.deposit_amount = value,
            TextField::FinalAmount => self.payment.final_amount = value,
            TextField::MaintenanceFee => self.payment.maintenance_fee = value,
            TextField::HourlyRate => self.payment.hourly_rate = value,
            TextField::PaymentDays => self.payment.payment_days = value,
        }
        Ok(())
    }

    pub fn set_service(&mut self, field: ServiceField, enabled: bool) {
        match field {
            ServiceField::Category(category) => *category.flag_mut(&mut self.services) = enabled,
            ServiceField::Option(option) => *option.flag_mut(&mut self.services) = enabled,
        }
    }

    pub fn set_section(&mut self, section: SectionKey, included: bool) {
        *section.flag_mut(&mut self.included_sections) = included;
    }

    pub fn add_milestone(&mut self, name: &str) -> usize {
        self.milestones.push(Milestone {
            name: name.to_string(),
            ..Milestone::default()
        });
        self.milestones.len()
    }

    /// `number` is 1-based, as milestones are numbered in the document.
    pub fn set_milestone(
        &mut self,
        number: usize,
        field: MilestoneField,
        value: &str,
    ) -> Result<(), DraftFieldError> {
        let milestone = number
            .checked_sub(1)
            .and_then(|index| self.milestones.get_mut(index))
            .ok_or(DraftFieldError::MilestoneOutOfRange(number))?;

        match field {
            MilestoneField::Name => milestone.name = value.to_string(),
            MilestoneField::Description => milestone.description = value.to_string(),
            MilestoneField::Deliverable => milestone.deliverable = value.to_string(),
            MilestoneField::DueDate => milestone.due_date = parse_optional_date(value)?,
            MilestoneField::Payment => milestone.payment = value.to_string(),
        }
        Ok(())
    }
}

fn parse_optional_date(value: &str) -> Result<Option<Date>, DraftFieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<Date>()
        .map(Some)
        .map_err(|e| DraftFieldError::InvalidDate(value.to_string(), e.to_string()))
}

/// Free-text fields of the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    ClientName,
    ClientCompany,
    ClientAddress,
    ClientCity,
    ClientState,
    ClientZip,
    ClientEmail,
    ClientPhone,
    ProjectName,
    ProjectDescription,
    TotalCost,
    ContractNumber,
    ContractDate,
    DepositAmount,
    FinalAmount,
    MaintenanceFee,
    HourlyRate,
    PaymentDays,
}

impl TextField {
    pub const ALL: [TextField; 18] = [
        TextField::ClientName,
        TextField::ClientCompany,
        TextField::ClientAddress,
        TextField::ClientCity,
        TextField::ClientState,
        TextField::ClientZip,
        TextField::ClientEmail,
        TextField::ClientPhone,
        TextField::ProjectName,
        TextField::ProjectDescription,
        TextField::TotalCost,
        TextField::ContractNumber,
        TextField::ContractDate,
        TextField::DepositAmount,
        TextField::FinalAmount,
        TextField::MaintenanceFee,
        TextField::HourlyRate,
        TextField::PaymentDays,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TextField::ClientName => "client-name",
            TextField::ClientCompany => "client-company",
            TextField::ClientAddress => "client-address",
            TextField::ClientCity => "client-city",
            TextField::ClientState => "client-state",
            TextField::ClientZip => "client-zip",
            TextField::ClientEmail => "client-email",
            TextField::ClientPhone => "client-phone",
            TextField::ProjectName => "project-name",
            TextField::ProjectDescription => "project-description",
            TextField::TotalCost => "total-cost",
            TextField::ContractNumber => "contract-number",
            TextField::ContractDate => "contract-date",
            TextField::DepositAmount => "deposit-amount",
            TextField::FinalAmount => "final-amount",
            TextField::MaintenanceFee => "maintenance-fee",
            TextField::HourlyRate => "hourly-rate",
            TextField::PaymentDays => "payment-days",
        }
    }
}

impl FromStr for TextField {
    type Err = DraftFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TextField::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| DraftFieldError::UnknownField(s.to_string()))
    }
}

/// The three top-level service groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCategory {
    Design,
    Development,
    Maintenance,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 3] = [
        ServiceCategory::Design,
        ServiceCategory::Development,
        ServiceCategory::Maintenance,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ServiceCategory::Design => "design",
            ServiceCategory::Development => "development",
            ServiceCategory::Maintenance => "maintenance",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ServiceCategory::Design => "Website Design",
            ServiceCategory::Development => "Website Development",
            ServiceCategory::Maintenance => "Website Maintenance",
        }
    }

    pub fn is_enabled(self, services: &Services) -> bool {
        match self {
            ServiceCategory::Design => services.website_design,
            ServiceCategory::Development => services.website_development,
            ServiceCategory::Maintenance => services.website_maintenance,
        }
    }

    fn flag_mut(self, services: &mut Services) -> &mut bool {
        match self {
            ServiceCategory::Design => &mut services.website_design,
            ServiceCategory::Development => &mut services.website_development,
            ServiceCategory::Maintenance => &mut services.website_maintenance,
        }
    }

    pub fn options(self) -> impl Iterator<Item = ServiceOption> {
        ServiceOption::ALL
            .into_iter()
            .filter(move |option| option.category() == self)
    }
}

/// Sub-options nested under a service category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceOption {
    UiuxConsultation,
    CustomMockups,
    ResponsiveDesign,
    BrandIntegration,
    Frontend,
    Backend,
    CmsIntegration,
    Ecommerce,
    Database,
    Api,
    ThirdPartyIntegration,
    RegularUpdates,
    ContentUpdates,
    PerformanceMonitoring,
    BackupRecovery,
    TechnicalSupport,
}

impl ServiceOption {
    pub const ALL: [ServiceOption; 16] = [
        ServiceOption::UiuxConsultation,
        ServiceOption::CustomMockups,
        ServiceOption::ResponsiveDesign,
        ServiceOption::BrandIntegration,
        ServiceOption::Frontend,
        ServiceOption::Backend,
        ServiceOption::CmsIntegration,
        ServiceOption::Ecommerce,
        ServiceOption::Database,
        ServiceOption::Api,
        ServiceOption::ThirdPartyIntegration,
        ServiceOption::RegularUpdates,
        ServiceOption::ContentUpdates,
        ServiceOption::PerformanceMonitoring,
        ServiceOption::BackupRecovery,
        ServiceOption::TechnicalSupport,
    ];

    pub fn category(self) -> ServiceCategory {
        match self {
            ServiceOption::UiuxConsultation
            | ServiceOption::CustomMockups
            | ServiceOption::ResponsiveDesign
            | ServiceOption::BrandIntegration => ServiceCategory::Design,
            ServiceOption::Frontend
            | ServiceOption::Backend
            | ServiceOption::CmsIntegration
            | ServiceOption::Ecommerce
            | ServiceOption::Database
            | ServiceOption::Api
            | ServiceOption::ThirdPartyIntegration => ServiceCategory::Development,
            ServiceOption::RegularUpdates
            | ServiceOption::ContentUpdates
            | ServiceOption::PerformanceMonitoring
            | ServiceOption::BackupRecovery
            | ServiceOption::TechnicalSupport => ServiceCategory::Maintenance,
        }
    }

    /// Key relative to the category, e.g. `custom-mockups`
    pub fn key(self) -> &'static str {
        match self {
            ServiceOption::UiuxConsultation => "uiux-consultation",
            ServiceOption::CustomMockups => "custom-mockups",
            ServiceOption::ResponsiveDesign => "responsive-design",
            ServiceOption::BrandIntegration => "brand-integration",
            ServiceOption::Frontend => "frontend",
            ServiceOption::Backend => "backend",
            ServiceOption::CmsIntegration => "cms-integration",
            ServiceOption::Ecommerce => "ecommerce",
            ServiceOption::Database => "database",
            ServiceOption::Api => "api",
            ServiceOption::ThirdPartyIntegration => "third-party-integration",
            ServiceOption::RegularUpdates => "regular-updates",
            ServiceOption::ContentUpdates => "content-updates",
            ServiceOption::PerformanceMonitoring => "performance-monitoring",
            ServiceOption::BackupRecovery => "backup-recovery",
            ServiceOption::TechnicalSupport => "technical-support",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ServiceOption::UiuxConsultation => "UI/UX Design Consultation",
            ServiceOption::CustomMockups => "Custom Design Mockups",
            ServiceOption::ResponsiveDesign => "Responsive Design",
            ServiceOption::BrandIntegration => "Brand Integration",
            ServiceOption::Frontend => "Frontend Development",
            ServiceOption::Backend => "Backend Development",
            ServiceOption::CmsIntegration => "CMS Integration",
            ServiceOption::Ecommerce => "E-commerce Functionality",
            ServiceOption::Database => "Database Design",
            ServiceOption::Api => "API Development",
            ServiceOption::ThirdPartyIntegration => "Third-Party Integrations",
            ServiceOption::RegularUpdates => "Regular Updates & Security Patches",
            ServiceOption::ContentUpdates => "Content Updates",
            ServiceOption::PerformanceMonitoring => "Performance Monitoring",
            ServiceOption::BackupRecovery => "Backup & Recovery",
            ServiceOption::TechnicalSupport => "Technical Support",
        }
    }

    pub fn is_selected(self, services: &Services) -> bool {
        let (design, development, maintenance) = (
            &services.design,
            &services.development,
            &services.maintenance,
        );
        match self {
            ServiceOption::UiuxConsultation => design.uiux_consultation,
            ServiceOption::CustomMockups => design.custom_mockups,
            ServiceOption::ResponsiveDesign => design.responsive_design,
            ServiceOption::BrandIntegration => design.brand_integration,
            ServiceOption::Frontend => development.frontend,
            ServiceOption::Backend => development.backend,
            ServiceOption::CmsIntegration => development.cms_integration,
            ServiceOption::Ecommerce => development.ecommerce,
            ServiceOption::Database => development.database,
            ServiceOption::Api => development.api,
            ServiceOption::ThirdPartyIntegration => development.third_party_integration,
            ServiceOption::RegularUpdates => maintenance.regular_updates,
            ServiceOption::ContentUpdates => maintenance.content_updates,
            ServiceOption::PerformanceMonitoring => maintenance.performance_monitoring,
            ServiceOption::BackupRecovery => maintenance.backup_recovery,
            ServiceOption::TechnicalSupport => maintenance.technical_support,
        }
    }

    fn flag_mut(self, services: &mut Services) -> &mut bool {
        match self {
            ServiceOption::UiuxConsultation => &mut services.design.uiux_consultation,
            ServiceOption::CustomMockups => &mut services.design.custom_mockups,
            ServiceOption::ResponsiveDesign => &mut services.design.responsive_design,
            ServiceOption::BrandIntegration => &mut services.design.brand_integration,
            ServiceOption::Frontend => &mut services.development.frontend,
            ServiceOption::Backend => &mut services.development.backend,
            ServiceOption::CmsIntegration => &mut services.development.cms_integration,
            ServiceOption::Ecommerce => &mut services.development.ecommerce,
            ServiceOption::Database => &mut services.development.database,
            ServiceOption::Api => &mut services.development.api,
            ServiceOption::ThirdPartyIntegration => {
                &mut services.development.third_party_integration
            }
            ServiceOption::RegularUpdates => &mut services.maintenance.regular_updates,
            ServiceOption::ContentUpdates => &mut services.maintenance.content_updates,
            ServiceOption::PerformanceMonitoring => {
                &mut services.maintenance.performance_monitoring
            }
            ServiceOption::BackupRecovery => &mut services.maintenance.backup_recovery,
            ServiceOption::TechnicalSupport => &mut services.maintenance.technical_support,
        }
    }
}

/// Either a whole category (`design`) or one of its options (`design.custom-mockups`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceField {
    Category(ServiceCategory),
    Option(ServiceOption),
}

impl FromStr for ServiceField {
    type Err = DraftFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || DraftFieldError::UnknownField(s.to_string());
        let (category_key, option_key) = match s.split_once('.') {
            Some((category, option)) => (category, Some(option)),
            None => (s, None),
        };

        let category = ServiceCategory::ALL
            .into_iter()
            .find(|c| c.key() == category_key)
            .ok_or_else(unknown)?;

        match option_key {
            None => Ok(ServiceField::Category(category)),
            Some(option_key) => category
                .options()
                .find(|o| o.key() == option_key)
                .map(ServiceField::Option)
                .ok_or_else(unknown),
        }
    }
}

/// Optional clauses, in the order they appear in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKey {
    ProjectOverview,
    Timeline,
    PaymentTerms,
    ClientResponsibilities,
    ProviderResponsibilities,
    IntellectualProperty,
    Warranty,
    Termination,
}

impl SectionKey {
    pub const ALL: [SectionKey; 8] = [
        SectionKey::ProjectOverview,
        SectionKey::Timeline,
        SectionKey::PaymentTerms,
        SectionKey::ClientResponsibilities,
        SectionKey::ProviderResponsibilities,
        SectionKey::IntellectualProperty,
        SectionKey::Warranty,
        SectionKey::Termination,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SectionKey::ProjectOverview => "project-overview",
            SectionKey::Timeline => "timeline",
            SectionKey::PaymentTerms => "payment-terms",
            SectionKey::ClientResponsibilities => "client-responsibilities",
            SectionKey::ProviderResponsibilities => "provider-responsibilities",
            SectionKey::IntellectualProperty => "intellectual-property",
            SectionKey::Warranty => "warranty",
            SectionKey::Termination => "termination",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SectionKey::ProjectOverview => "Project Overview",
            SectionKey::Timeline => "Timeline & Milestones",
            SectionKey::PaymentTerms => "Payment Terms",
            SectionKey::ClientResponsibilities => "Client Responsibilities",
            SectionKey::ProviderResponsibilities => "Provider Responsibilities",
            SectionKey::IntellectualProperty => "Intellectual Property",
            SectionKey::Warranty => "Warranty & Support",
            SectionKey::Termination => "Termination",
        }
    }

    pub fn is_included(self, sections: &IncludedSections) -> bool {
        match self {
            SectionKey::ProjectOverview => sections.project_overview,
            SectionKey::Timeline => sections.timeline,
            SectionKey::PaymentTerms => sections.payment_terms,
            SectionKey::ClientResponsibilities => sections.client_responsibilities,
            SectionKey::ProviderResponsibilities => sections.provider_responsibilities,
            SectionKey::IntellectualProperty => sections.intellectual_property,
            SectionKey::Warranty => sections.warranty,
            SectionKey::Termination => sections.termination,
        }
    }

    fn flag_mut(self, sections: &mut IncludedSections) -> &mut bool {
        match self {
            SectionKey::ProjectOverview => &mut sections.project_overview,
            SectionKey::Timeline => &mut sections.timeline,
            SectionKey::PaymentTerms => &mut sections.payment_terms,
            SectionKey::ClientResponsibilities => &mut sections.client_responsibilities,
            SectionKey::ProviderResponsibilities => &mut sections.provider_responsibilities,
            SectionKey::IntellectualProperty => &mut sections.intellectual_property,
            SectionKey::Warranty => &mut sections.warranty,
            SectionKey::Termination => &mut sections.termination,
        }
    }
}

impl FromStr for SectionKey {
    type Err = DraftFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionKey::ALL
            .into_iter()
            .find(|section| section.key() == s)
            .ok_or_else(|| DraftFieldError::UnknownField(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneField {
    Name,
    Description,
    Deliverable,
    DueDate,
    Payment,
}

impl FromStr for MilestoneField {
    type Err = DraftFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(MilestoneField::Name),
            "description" => Ok(MilestoneField::Description),
            "deliverable" => Ok(MilestoneField::Deliverable),
            "due-date" => Ok(MilestoneField::DueDate),
            "payment" => Ok(MilestoneField::Payment),
            _ => Err(DraftFieldError::UnknownField(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_client_and_project_name() {
        let draft = ContractDraft {
            client: ClientInfo {
                name: "   ".to_string(),
                ..ClientInfo::default()
            },
            ..ContractDraft::default()
        };

        assert_eq!(
            draft.validate(),
            Err(ValidationError::MissingFields(vec![
                "client name",
                "project name"
            ]))
        );
    }

    #[test]
    fn test_seeded_draft_matches_dashboard_defaults() {
        let today: Date = "2025-03-01".parse().unwrap();
        let draft = ContractDraft::seeded(today);

        assert_eq!(draft.client.state, "TX");
        assert_eq!(draft.project.contract_date, Some(today));
        assert_eq!(draft.payment.payment_days, "30");
        assert_eq!(draft.milestones.len(), 4);
        assert!(draft.milestones.iter().all(|m| m.payment == "25"));
        assert!(SectionKey::ALL
            .into_iter()
            .all(|s| s.is_included(&draft.included_sections)));
    }

    #[test]
    fn test_service_field_parsing() {
        assert_eq!(
            "design".parse::<ServiceField>(),
            Ok(ServiceField::Category(ServiceCategory::Design))
        );
        assert_eq!(
            "design.custom-mockups".parse::<ServiceField>(),
            Ok(ServiceField::Option(ServiceOption::CustomMockups))
        );
        // Options only resolve under their own category
        assert!(matches!(
            "maintenance.custom-mockups".parse::<ServiceField>(),
            Err(DraftFieldError::UnknownField(_))
        ));
    }

    #[test]
    fn test_sub_option_can_be_set_without_parent() {
        let mut draft = ContractDraft::default();
        draft.set_service(ServiceField::Option(ServiceOption::Ecommerce), true);

        assert!(ServiceOption::Ecommerce.is_selected(&draft.services));
        assert!(!ServiceCategory::Development.is_enabled(&draft.services));
    }

    #[test]
    fn test_set_text_parses_contract_date() {
        let mut draft = ContractDraft::default();
        draft
            .set_text(TextField::ContractDate, "2025-06-30")
            .unwrap();
        assert_eq!(draft.project.contract_date, "2025-06-30".parse().ok());

        let result = draft.set_text(TextField::ContractDate, "next tuesday");
        assert!(matches!(result, Err(DraftFieldError::InvalidDate(..))));

        draft.set_text(TextField::ContractDate, "").unwrap();
        assert_eq!(draft.project.contract_date, None);
    }

    #[test]
    fn test_set_milestone_is_one_based() {
        let mut draft = ContractDraft::default();
        assert_eq!(draft.add_milestone("Kickoff"), 1);

        draft
            .set_milestone(1, MilestoneField::Payment, "40")
            .unwrap();
        assert_eq!(draft.milestones[0].payment, "40");

        assert_eq!(
            draft.set_milestone(0, MilestoneField::Name, "x"),
            Err(DraftFieldError::MilestoneOutOfRange(0))
        );
        assert_eq!(
            draft.set_milestone(2, MilestoneField::Name, "x"),
            Err(DraftFieldError::MilestoneOutOfRange(2))
        );
    }
}
