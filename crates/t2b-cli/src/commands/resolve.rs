//! `t2b resolve`: expand metadata templates.
//!
//! No class is in scope, so `class.`/`method.`/`package.` variables fall
//! back to their defaults.

use std::path::PathBuf;
use t2b_metadata::{MetadataResolver, ResolutionConfig, ResolutionContext};

pub fn execute(define: Vec<String>, config: Option<PathBuf>, templates: Vec<String>) -> anyhow::Result<()> {
    let properties = super::system_properties(define, config)?;
    let config = ResolutionConfig::load(&properties);
    let resolver = MetadataResolver::new(&config, &properties);

    if templates.is_empty() {
        for (key, template) in config.member_entries() {
            println!("{}={}", key, resolver.resolve_template(template, ResolutionContext::Detached));
        }
    } else {
        for template in &templates {
            println!("{}", resolver.resolve_template(template, ResolutionContext::Detached));
        }
    }

    Ok(())
}
