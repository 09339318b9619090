// SPDX-License-Identifier: GPL-3.0-only

//! Plain text rendering of devices and events.

use std::io::{self, Write};

use hwkit_contracts::RegistryEvent;
use hwkit_core::DeviceReport;
use hwkit_types::{PropertyMap, PropertyValue};

fn value(value: &PropertyValue) -> String {
    format!("{value}  ({})", value.type_name())
}

fn text(s: &str) -> String {
    value(&PropertyValue::from(s))
}

pub fn write_udi(out: &mut impl Write, udi: &str) -> io::Result<()> {
    writeln!(out, "udi = '{udi}'")
}

/// Platform neutral view: display fields, then one line per interface property.
pub fn write_details(out: &mut impl Write, report: &DeviceReport) -> io::Result<()> {
    write_udi(out, &report.udi)?;
    writeln!(out, "  parent = {}", text(&report.parent_udi))?;
    writeln!(out, "  vendor = {}", text(&report.vendor))?;
    writeln!(out, "  product = {}", text(&report.product))?;
    writeln!(out, "  description = {}", text(&report.description))?;
    writeln!(out, "  icon = {}", text(&report.icon))?;
    if !report.emblems.is_empty() {
        let emblems = PropertyValue::from(report.emblems.clone());
        writeln!(out, "  emblems = {}", value(&emblems))?;
    }

    for interface in &report.interfaces {
        for (key, v) in interface.properties.iter() {
            writeln!(out, "  {}.{key} = {}", interface.interface, value(v))?;
        }
    }
    writeln!(out)
}

/// Raw registry properties, keys as the backend spells them.
pub fn write_properties(out: &mut impl Write, udi: &str, properties: &PropertyMap) -> io::Result<()> {
    write_udi(out, udi)?;
    for (key, v) in properties.iter() {
        writeln!(out, "  {key} = {}", value(v))?;
    }
    writeln!(out)
}

pub fn write_event(out: &mut impl Write, event: &RegistryEvent) -> io::Result<()> {
    let (heading, udi) = match event {
        RegistryEvent::Added(udi) => ("Device Added:", udi),
        RegistryEvent::Removed(udi) => ("Device Removed:", udi),
    };
    writeln!(out, "{heading}")?;
    write_udi(out, udi)?;
    writeln!(out)
}
