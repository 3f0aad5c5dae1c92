use std::sync::Arc;

use crate::attributes::{get_things, Payload};
use crate::engine::channel::CommandChannel;
use crate::engine::messages::Value;
use crate::error::CboxResult;
use crate::schema::Schema;

#[derive(Clone)]
pub struct Config {
    channel: Arc<dyn CommandChannel>,
}

impl Config {
    pub fn new(channel: Arc<dyn CommandChannel>) -> Self {
        Self { channel }
    }

    /// Sections whose names start with `prefix`.
    pub fn sections(&self, prefix: &str) -> CboxResult<Vec<CfgSection>> {
        let attrs = get_things(
            self.channel.as_ref(),
            "/config/sections",
            &Schema::new().sequence("section"),
            &[prefix.into()],
        )?;
        Ok(attrs
            .sequence("section")
            .iter()
            .filter_map(Payload::as_str)
            .map(|name| self.section(name))
            .collect())
    }

    pub fn section(&self, name: &str) -> CfgSection {
        CfgSection {
            name: name.to_string(),
            config: self.clone(),
        }
    }

    pub fn keys(&self, section: &str, prefix: &str) -> CboxResult<Vec<String>> {
        let attrs = get_things(
            self.channel.as_ref(),
            "/config/keys",
            &Schema::new().sequence("key"),
            &[section.into(), prefix.into()],
        )?;
        Ok(attrs
            .sequence("key")
            .iter()
            .filter_map(Payload::as_str)
            .map(str::to_string)
            .collect())
    }

    pub fn get(&self, section: &str, key: &str) -> CboxResult<Option<Value>> {
        let attrs = get_things(
            self.channel.as_ref(),
            "/config/get",
            &Schema::new().scalar("value"),
            &[section.into(), key.into()],
        )?;
        Ok(attrs.value("value").cloned())
    }

    pub fn set(&self, section: &str, key: &str, value: &Value) -> CboxResult<()> {
        self.channel.fire(
            "/config/set",
            &[section.into(), key.into(), value.to_arg_string().into()],
        )
    }

    pub fn delete(&self, section: &str, key: &str) -> CboxResult<()> {
        self.channel
            .fire("/config/delete", &[section.into(), key.into()])
    }

    /// Writes the configuration to `filename`, or back to where it was
    /// loaded from.
    pub fn save(&self, filename: Option<&str>) -> CboxResult<()> {
        match filename {
            Some(f) => self.channel.fire("/config/save", &[f.into()]),
            None => self.channel.fire("/config/save", &[]),
        }
    }
}

#[derive(Clone)]
pub struct CfgSection {
    pub name: String,
    config: Config,
}

impl CfgSection {
    pub fn get(&self, key: &str) -> CboxResult<Option<Value>> {
        self.config.get(&self.name, key)
    }

    pub fn set(&self, key: &str, value: &Value) -> CboxResult<()> {
        self.config.set(&self.name, key, value)
    }

    pub fn delete(&self, key: &str) -> CboxResult<()> {
        self.config.delete(&self.name, key)
    }

    pub fn keys(&self, prefix: &str) -> CboxResult<Vec<String>> {
        self.config.keys(&self.name, prefix)
    }
}
