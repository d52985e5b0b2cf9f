//! Screen catalog.
//!
//! A [`ScreenProfile`] bundles what one screen needs to be driven by a
//! [`crate::ScreenController`]: the remote resource with its response
//! envelope, the form rules, and how its list is searched.

use membercare_core::envelope::EnvelopeShape;
use membercare_core::filter::ListFilter;
use membercare_core::form::{FormSchema, Rule};
use membercare_core::resource::Resource;

/// Relations accepted by the family member registry.
pub const FAMILY_RELATIONS: [&str; 4] = ["Spouse", "Child", "Parent", "Sibling"];

/// Ticket categories accepted by support.
pub const TICKET_CATEGORIES: [&str; 4] = ["Claims", "Billing", "Coverage", "App"];

#[derive(Debug, Clone)]
pub struct ScreenProfile {
    pub resource: Resource,
    pub schema: FormSchema,
    pub filter: ListFilter,
    /// Whether the screen shows a list. Form-only screens never fetch.
    pub lists: bool,
}

impl ScreenProfile {
    /// Profile for a list screen without a form.
    pub fn list(resource: Resource, filter: ListFilter) -> Self {
        Self {
            resource,
            schema: FormSchema::new(),
            filter,
            lists: true,
        }
    }

    /// Profile for a form that only posts.
    pub fn form(resource: Resource, schema: FormSchema) -> Self {
        Self {
            resource,
            schema,
            filter: ListFilter::default(),
            lists: false,
        }
    }

    /// Profile for a screen with both a list and an entry form.
    pub fn form_and_list(resource: Resource, schema: FormSchema, filter: ListFilter) -> Self {
        Self {
            resource,
            schema,
            filter,
            lists: true,
        }
    }

    pub fn contact_form() -> Self {
        Self::form(
            Resource::new("contact requests", "support/contact"),
            FormSchema::new()
                .field("name", [Rule::Required, Rule::MaxLength(100)])
                .field("email", [Rule::Required, Rule::Email])
                .field("phone", [Rule::ExactDigits(10)])
                .field("message", [Rule::Required, Rule::MaxLength(1000)]),
        )
    }

    pub fn coverage_check() -> Self {
        Self::form(
            Resource::new("coverage checks", "coverage/check"),
            FormSchema::new()
                .field("member_id", [Rule::Required])
                .field("treatment", [Rule::Required])
                .field("hospital", [Rule::Required])
                .field("estimated_cost", [Rule::Numeric]),
        )
    }

    pub fn family_members() -> Self {
        Self::form_and_list(
            Resource::new("family members", "members/family").with_envelope(EnvelopeShape::NestedData),
            FormSchema::new()
                .field("full_name", [Rule::Required, Rule::MinLength(2)])
                .field("relation", [Rule::Required, one_of(&FAMILY_RELATIONS)])
                .field("date_of_birth", [Rule::Required])
                .field("phone", [Rule::ExactDigits(10)]),
            ListFilter::new(["full_name", "relation"]).with_category_field("relation"),
        )
    }

    pub fn wellness_log() -> Self {
        Self::form_and_list(
            Resource::new("wellness logs", "wellness/logs").with_envelope(EnvelopeShape::field("logs")),
            FormSchema::new()
                .field("activity", [Rule::Required])
                .field("duration_minutes", [Rule::Required, Rule::Numeric])
                .field("notes", [Rule::MaxLength(500)]),
            ListFilter::new(["activity", "notes"]).with_category_field("activity"),
        )
    }

    pub fn support_tickets() -> Self {
        Self::form_and_list(
            Resource::new("support tickets", "support/tickets"),
            FormSchema::new()
                .field("subject", [Rule::Required, Rule::MaxLength(120)])
                .field("category", [Rule::Required, one_of(&TICKET_CATEGORIES)])
                .field("description", [Rule::Required, Rule::MinLength(10)]),
            ListFilter::new(["subject", "description"]),
        )
    }

    /// Public document catalog; readable without signing in.
    pub fn downloads() -> Self {
        Self::list(
            Resource::new("downloads", "downloads").public(),
            ListFilter::new(["title", "description"]),
        )
    }
}

fn one_of(options: &[&str]) -> Rule {
    Rule::OneOf(options.iter().map(|option| option.to_string()).collect())
}
