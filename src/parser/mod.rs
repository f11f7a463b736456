pub mod html;
pub mod pages;
pub mod sections;

pub use html::{parse_anchor, parse_links};
pub use pages::{
    parse_capability_page, parse_document_page, parse_domain_page, parse_metadata_card,
    parse_policy_page,
};
pub use sections::{find_section, nth_heading, Section};
