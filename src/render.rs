//! Turns a contract draft into documents.
//!
//! Both renderers read the same section catalogue built here, so the HTML
//! preview and the PDF always carry the same clauses in the same order.
//! Rendering is a pure function of [`ContractDocument`]: nothing reads the
//! clock, so identical input gives identical output.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    contract::Contract,
    draft::{ClientInfo, ContractDraft, SectionKey, ServiceCategory, Services},
};

pub mod html;
pub mod layout;
pub mod metrics;
pub mod pdf;

pub const DOCUMENT_TITLE: &str = "WEB SERVICES AGREEMENT";

/// Shown wherever an optional field was left empty
pub const PLACEHOLDER: &str = "N/A";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Page geometry leaves no room for content: {0}")]
    InvalidGeometry(String),

    #[error("Failed to write PDF output: {0}")]
    Io(#[from] std::io::Error),
}

/// The party issuing the contract.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Provider {
    pub name: String,
    pub location: String,
    pub email: String,
}

impl Default for Provider {
    fn default() -> Self {
        Self {
            name: "elgAtoAi".to_string(),
            location: "Dallas, TX".to_string(),
            email: "contracts@elgatoai.com".to_string(),
        }
    }
}

/// Everything a renderer needs.
#[derive(Debug, Clone, Copy)]
pub struct ContractDocument<'a> {
    pub contract_id: &'a str,
    pub draft: &'a ContractDraft,
    pub provider: &'a Provider,
}

impl<'a> ContractDocument<'a> {
    /// The document as it was issued, with the provider recorded at creation.
    pub fn issued(contract: &'a Contract) -> Self {
        Self {
            contract_id: &contract.contract_id,
            draft: &contract.draft,
            provider: &contract.provider,
        }
    }

    pub fn contract_date(&self) -> String {
        self.draft
            .project
            .contract_date
            .map(|date| date.strftime("%B %-d, %Y").to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    /// Sections whose flag is on, numbered in canonical order.
    pub fn sections(&self) -> Vec<Section> {
        SectionKey::ALL
            .into_iter()
            .filter(|key| key.is_included(&self.draft.included_sections))
            .enumerate()
            .map(|(index, key)| Section {
                number: index + 1,
                key,
                content: section_content(key, self.draft, self.provider),
            })
            .collect()
    }
}

/// One numbered clause of the contract body.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub number: usize,
    pub key: SectionKey,
    pub content: Vec<Content>,
}

impl Section {
    /// e.g. `2. TIMELINE & MILESTONES`
    pub fn heading(&self) -> String {
        format!("{}. {}", self.number, self.key.title().to_uppercase())
    }
}

/// Renderer-neutral building blocks of a section.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Paragraph(String),
    Subheading(String),
    Bullets(Vec<String>),
    /// `label: value` lines
    Fields(Vec<(&'static str, String)>),
}

pub fn or_placeholder(value: &str) -> &str {
    if value.trim().is_empty() {
        PLACEHOLDER
    } else {
        value
    }
}

pub fn money(value: &str) -> String {
    if value.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        format!("${}", value.trim())
    }
}

/// `street, city, state zip`, skipping empty parts.
pub fn client_address(client: &ClientInfo) -> String {
    let state_zip = [client.state.trim(), client.zip.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    [client.address.trim(), client.city.trim(), state_zip.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One line per enabled category: `Website Design (Custom Design Mockups, Brand Integration)`.
/// The parenthesized part is omitted when no sub-option is set.
pub fn service_line_items(services: &Services) -> Vec<String> {
    ServiceCategory::ALL
        .into_iter()
        .filter(|category| category.is_enabled(services))
        .map(|category| {
            let options: Vec<&str> = category
                .options()
                .filter(|option| option.is_selected(services))
                .map(|option| option.label())
                .collect();

            if options.is_empty() {
                category.label().to_string()
            } else {
                format!("{} ({})", category.label(), options.join(", "))
            }
        })
        .collect()
}

fn section_content(key: SectionKey, draft: &ContractDraft, provider: &Provider) -> Vec<Content> {
    let provider_name = provider.name.as_str();

    match key {
        SectionKey::ProjectOverview => {
            let services = service_line_items(&draft.services);
            vec![
                Content::Fields(vec![
                    ("Project", or_placeholder(&draft.project.name).to_string()),
                    (
                        "Description",
                        or_placeholder(&draft.project.description).to_string(),
                    ),
                    ("Total Investment", money(&draft.project.total_cost)),
                ]),
                Content::Subheading("Services Included".to_string()),
                if services.is_empty() {
                    Content::Paragraph("No services have been selected.".to_string())
                } else {
                    Content::Bullets(services)
                },
            ]
        }
        SectionKey::Timeline => {
            if draft.milestones.is_empty() {
                return vec![Content::Paragraph(
                    "No milestones have been defined for this project.".to_string(),
                )];
            }

            let mut content = vec![Content::Paragraph(
                "The project will be delivered in the following phases:".to_string(),
            )];
            for (index, milestone) in draft.milestones.iter().enumerate() {
                content.push(Content::Subheading(format!(
                    "Milestone {}: {}",
                    index + 1,
                    or_placeholder(&milestone.name)
                )));

                let mut fields = vec![
                    (
                        "Description",
                        or_placeholder(&milestone.description).to_string(),
                    ),
                    (
                        "Deliverable",
                        or_placeholder(&milestone.deliverable).to_string(),
                    ),
                ];
                if let Some(due_date) = milestone.due_date {
                    fields.push(("Due Date", due_date.strftime("%B %-d, %Y").to_string()));
                }
                let payment = if milestone.payment.trim().is_empty() {
                    PLACEHOLDER.to_string()
                } else {
                    format!("{}% of total", milestone.payment.trim())
                };
                fields.push(("Payment", payment));
                content.push(Content::Fields(fields));
            }
            content
        }
        SectionKey::PaymentTerms => {
            let days = or_placeholder(&draft.payment.payment_days);
            vec![
                Content::Fields(vec![
                    ("Total Project Cost", money(&draft.project.total_cost)),
                    ("Deposit", money(&draft.payment.deposit_amount)),
                    ("Final Payment", money(&draft.payment.final_amount)),
                    ("Monthly Maintenance Fee", money(&draft.payment.maintenance_fee)),
                    ("Hourly Rate for Additional Work", money(&draft.payment.hourly_rate)),
                ]),
                Content::Paragraph(
                    "Milestone payments are due upon completion of each milestone.".to_string(),
                ),
                Content::Paragraph(format!(
                    "Invoices are payable within {} days of receipt. Late payments accrue a fee of 1.5% per month.",
                    days
                )),
            ]
        }
        SectionKey::ClientResponsibilities => vec![
            Content::Paragraph("The Client agrees to:".to_string()),
            Content::Bullets(
                [
                    "Provide all content, images, and materials needed for the project in a timely manner",
                    "Review and approve deliverables within five (5) business days of submission",
                    "Designate one point of contact with authority to make project decisions",
                    "Provide access to existing systems, accounts, and hosting as required",
                    "Make payments according to the agreed schedule",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
            ),
        ],
        SectionKey::ProviderResponsibilities => vec![
            Content::Paragraph(format!("{} agrees to:", provider_name)),
            Content::Bullets(
                [
                    "Deliver the services described in this agreement in a professional manner",
                    "Meet the milestone dates in this agreement, subject to timely Client feedback",
                    "Report progress to the Client at the end of each milestone",
                    "Follow industry practices for security, performance, and accessibility",
                    "Keep all Client information confidential",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
            ),
        ],
        SectionKey::IntellectualProperty => vec![
            Content::Paragraph(
                "Upon receipt of full payment, the Client owns all rights to the final deliverables created specifically for this project.".to_string(),
            ),
            Content::Paragraph(format!(
                "{} retains ownership of pre-existing tools, frameworks, and code libraries, and grants the Client a non-exclusive, perpetual license to use them as part of the deliverables.",
                provider_name
            )),
            Content::Paragraph(format!(
                "{} may show the completed work in its portfolio unless the Client objects in writing.",
                provider_name
            )),
        ],
        SectionKey::Warranty => {
            let support = if draft.services.website_maintenance {
                "Support after that period is provided under the maintenance services in this agreement."
            } else {
                "Support after that period is billed at the hourly rate in this agreement."
            };
            vec![
                Content::Paragraph(format!(
                    "{} warrants that the deliverables will function materially as described for thirty (30) days after launch. Defects reported in that period are corrected at no additional cost.",
                    provider_name
                )),
                Content::Paragraph(support.to_string()),
            ]
        }
        SectionKey::Termination => vec![
            Content::Paragraph(
                "Either party may terminate this agreement with fourteen (14) days written notice.".to_string(),
            ),
            Content::Paragraph(format!(
                "On termination the Client pays for all work completed up to the termination date, and {} delivers all completed work.",
                provider_name
            )),
            Content::Paragraph("Deposits are non-refundable once work has begun.".to_string()),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::draft::{ServiceField, ServiceOption};

    #[test]
    fn test_service_line_items() {
        let mut draft = ContractDraft::default();
        draft.services.website_design = true;
        draft.set_service(ServiceField::Option(ServiceOption::CustomMockups), true);
        draft.set_service(ServiceField::Option(ServiceOption::BrandIntegration), true);
        draft.services.website_maintenance = true;
        // Sub-option under a disabled category is not listed
        draft.set_service(ServiceField::Option(ServiceOption::Ecommerce), true);

        assert_eq!(
            service_line_items(&draft.services),
            vec![
                "Website Design (Custom Design Mockups, Brand Integration)".to_string(),
                "Website Maintenance".to_string(),
            ]
        );
    }

    #[test]
    fn test_sections_are_numbered_among_included() {
        let mut draft = ContractDraft::default();
        draft.set_section(SectionKey::ProjectOverview, false);
        draft.set_section(SectionKey::Timeline, false);
        let provider = Provider::default();
        let document = ContractDocument {
            contract_id: "CTR-1",
            draft: &draft,
            provider: &provider,
        };

        let sections = document.sections();

        assert_eq!(sections.len(), 6);
        assert_eq!(sections[0].heading(), "1. PAYMENT TERMS");
        assert_eq!(sections[5].heading(), "6. TERMINATION");
    }

    #[test]
    fn test_client_address_skips_empty_parts() {
        let client = ClientInfo {
            address: "1 Main St".to_string(),
            state: "TX".to_string(),
            zip: "75001".to_string(),
            ..ClientInfo::default()
        };
        assert_eq!(client_address(&client), "1 Main St, TX 75001");
        assert_eq!(client_address(&ClientInfo::default()), "");
    }

    #[test]
    fn test_missing_due_date_is_omitted() {
        let mut draft = ContractDraft::default();
        draft.add_milestone("Kickoff");
        let provider = Provider::default();
        let document = ContractDocument {
            contract_id: "CTR-1",
            draft: &draft,
            provider: &provider,
        };

        let timeline = document
            .sections()
            .into_iter()
            .find(|s| s.key == SectionKey::Timeline)
            .unwrap();

        let labels: Vec<&str> = timeline
            .content
            .iter()
            .filter_map(|c| match c {
                Content::Fields(fields) => Some(fields.iter().map(|(label, _)| *label)),
                _ => None,
            })
            .flatten()
            .collect();
        assert_eq!(labels, vec!["Description", "Deliverable", "Payment"]);
    }
}
