// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Streaming RDF/XML generation for access-role models.
//!
//! Responsibilities:
//! - Write the `rdf:RDF` envelope with every configured namespace declared.
//! - Emit the `md:FullModel` header describing the generated model.
//! - Emit one Role → Privilege → DataGroup → ObjectReference chain per CSV row.
//!
//! Column names only enter through the configured name templates and the
//! first `_uid` column of a row; nothing here knows what the columns mean.

use std::io::Write;

use anyhow::{Context, Result, anyhow, bail};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::debug;

use crate::config::{AppConfig, FixedResources, XmlGenerationConfig};
use crate::models::row::{CsvRow, gen_uid};

/// Namespace prefixes the generator writes element names with.
const REQUIRED_PREFIXES: [&str; 3] = ["rdf", "md", "cim"];

/// Static settings shared by every document the generator writes.
#[derive(Clone, Debug)]
pub struct XmlGenerator {
    xml: XmlGenerationConfig,
    role_template: String,
    datagroup_template: String,
}

/// Identifiers minted for one generated role structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleStructureIds {
    pub role: String,
    pub privilege: String,
    pub datagroup: String,
    pub object_reference: String,
}

/// An open `rdf:RDF` document being streamed into `W`.
pub struct RdfDocument<'g, W: Write> {
    generator: &'g XmlGenerator,
    writer: Writer<W>,
}

impl XmlGenerator {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            xml: config.xml_generation.clone(),
            role_template: config.csv_processing.role_template.clone(),
            datagroup_template: config.csv_processing.datagroup_template.clone(),
        }
    }

    fn fixed(&self) -> &FixedResources {
        &self.xml.fixed_resources
    }

    /// Namespace declarations for the root element, sorted by prefix.
    fn root_namespaces(&self) -> Vec<(String, String)> {
        let mut namespaces = self.xml.namespaces.clone();
        for prefix in REQUIRED_PREFIXES {
            if !namespaces.contains_key(prefix)
                && let Some(uri) = self.xml.namespace(prefix)
            {
                namespaces.insert(prefix.to_string(), uri.to_string());
            }
        }
        namespaces
            .into_iter()
            .map(|(prefix, uri)| (format!("xmlns:{prefix}"), uri))
            .collect()
    }

    /// Write the XML declaration and open the `rdf:RDF` root element.
    pub fn begin<W: Write>(&self, out: W) -> Result<RdfDocument<'_, W>> {
        let mut writer = Writer::new_with_indent(out, b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .context("Failed to write XML declaration")?;

        let declarations = self.root_namespaces();
        let root = BytesStart::new("rdf:RDF").with_attributes(
            declarations
                .iter()
                .map(|(name, uri)| (name.as_str(), uri.as_str())),
        );
        writer
            .write_event(Event::Start(root))
            .context("Failed to open rdf:RDF element")?;

        Ok(RdfDocument {
            generator: self,
            writer,
        })
    }
}

impl<W: Write> RdfDocument<'_, W> {
    /// Emit the `md:FullModel` header and return its identifier.
    pub fn add_full_model(
        &mut self,
        model_version: &str,
        model_name: &str,
        created: OffsetDateTime,
    ) -> Result<String> {
        let model_uid = gen_uid();
        let created = format_created(created)?;

        self.start("md:FullModel", &[("rdf:about", about(&model_uid).as_str())])?;
        self.text_element("md:Model.created", &[], &created)?;
        self.text_element("md:Model.version", &[], model_version)?;
        match self.generator.xml.me_namespace.clone() {
            Some(me) => {
                self.text_element("me:Model.name", &[("xmlns:me", me.as_str())], model_name)?
            }
            None => self.text_element("md:Model.name", &[], model_name)?,
        }
        self.end("md:FullModel")?;

        Ok(model_uid)
    }

    /// Emit the Role, Privilege, DataGroup and ObjectReference nodes for one row.
    ///
    /// The role is parented to `folder_uid`; the object reference points at
    /// the value of the row's first `_uid` column.
    pub fn add_role_structure(&mut self, row: &CsvRow, folder_uid: &str) -> Result<RoleStructureIds> {
        let (uid_field, object_uid) = row.object_uid().ok_or_else(|| {
            anyhow!(
                "Line {}: no column containing '_uid' for ObjectReference.objectUid",
                row.line
            )
        })?;
        debug!(line = row.line, "generating structure for {uid_field}={object_uid}");

        let role_name = render_template(&self.generator.role_template, row)
            .with_context(|| format!("Line {}: failed to render role name", row.line))?;
        let datagroup_name = render_template(&self.generator.datagroup_template, row)
            .with_context(|| format!("Line {}: failed to render data group name", row.line))?;

        let ids = RoleStructureIds {
            role: gen_uid(),
            privilege: gen_uid(),
            datagroup: gen_uid(),
            object_reference: gen_uid(),
        };
        debug!(
            role = %ids.role,
            privilege = %ids.privilege,
            datagroup = %ids.datagroup,
            object_reference = %ids.object_reference,
            role_name = %role_name,
            datagroup_name = %datagroup_name,
            "generated identifiers"
        );

        let fixed = self.generator.fixed().clone();
        let role_ref = about(&ids.role);
        let privilege_ref = about(&ids.privilege);
        let datagroup_ref = about(&ids.datagroup);
        let objectref_ref = about(&ids.object_reference);

        self.start("cim:Role", &[("rdf:about", role_ref.as_str())])?;
        self.text_element("cim:IdentifiedObject.name", &[], &role_name)?;
        self.resource("cim:IdentifiedObject.ParentObject", &about(folder_uid))?;
        self.resource("cim:Role.kind", "cim:RoleKind.allow")?;
        self.text_element("cim:Role.isHost", &[], "false")?;
        self.text_element("cim:Role.isUser", &[], "true")?;
        self.resource("cim:Role.Privileges", &privilege_ref)?;
        self.end("cim:Role")?;

        self.start("cim:Privilege", &[("rdf:about", privilege_ref.as_str())])?;
        self.resource("cim:Privilege.Role", &role_ref)?;
        self.resource("cim:Privilege.DataItems", &datagroup_ref)?;
        self.resource("cim:Privilege.Operation", &fixed.privilege_operation)?;
        self.end("cim:Privilege")?;

        self.start("cim:DataGroup", &[("rdf:about", datagroup_ref.as_str())])?;
        self.text_element("cim:IdentifiedObject.name", &[], &datagroup_name)?;
        self.resource(
            "cim:IdentifiedObject.ParentObject",
            &fixed.datagroup_parent_object,
        )?;
        self.text_element("cim:DataItem.isHostRestricted", &[], "false")?;
        self.text_element("cim:DataItem.isUserRestricted", &[], "true")?;
        self.resource("cim:DataItem.Privileges", &privilege_ref)?;
        self.resource("cim:DataItem.Category", &fixed.dataitem_category)?;
        self.resource("cim:DataGroup.Class", &fixed.datagroup_class)?;
        self.resource("cim:DataGroup.Objects", &objectref_ref)?;
        self.end("cim:DataGroup")?;

        self.start("cim:ObjectReference", &[("rdf:about", objectref_ref.as_str())])?;
        self.text_element("cim:ObjectReference.objectUid", &[], object_uid)?;
        self.resource("cim:ObjectReference.Group", &datagroup_ref)?;
        self.end("cim:ObjectReference")?;

        Ok(ids)
    }

    /// Close the root element and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.end("rdf:RDF")?;
        let mut out = self.writer.into_inner();
        out.write_all(b"\n")
            .context("Failed to terminate XML document")?;
        Ok(out)
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let element = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer
            .write_event(Event::Start(element))
            .with_context(|| format!("Failed to write <{name}>"))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .with_context(|| format!("Failed to write </{name}>"))
    }

    fn text_element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .with_context(|| format!("Failed to write text of <{name}>"))?;
        self.end(name)
    }

    /// Empty element carrying an `rdf:resource` reference.
    fn resource(&mut self, name: &str, resource: &str) -> Result<()> {
        let element = BytesStart::new(name).with_attributes([("rdf:resource", resource)]);
        self.writer
            .write_event(Event::Empty(element))
            .with_context(|| format!("Failed to write <{name}/>"))
    }
}

fn about(uid: &str) -> String {
    format!("#_{uid}")
}

fn format_created(created: OffsetDateTime) -> Result<String> {
    created
        .to_offset(time::UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
        ))
        .map_err(|err| anyhow!("Failed to format model timestamp: {err}"))
}

/// Substitute `{field}` placeholders with values from `row`.
///
/// Placeholder names are matched like CSV headers (trimmed, case-insensitive).
/// `{{` and `}}` produce literal braces. Unknown fields and unbalanced braces
/// are errors.
pub fn render_template(template: &str, row: &CsvRow) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => bail!("Unclosed '{{' in template {template:?}"),
                    }
                }
                let key = name.trim().to_lowercase();
                let value = row
                    .get(&key)
                    .ok_or_else(|| anyhow!("Template field '{key}' is missing from the row"))?;
                out.push_str(value);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => bail!("Single '}}' in template {template:?}"),
            c => out.push(c),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::field_reassign_with_default)]

    use super::*;
    use quick_xml::Reader;

    const FOLDER: &str = "3f2a9c1e-7b4d-4e8a-a1c5-9d0e6b2f4a77";
    const OBJECT: &str = "8d3c7f0e-2a41-4b6e-9f1d-5c2b8a7e4d10";

    fn row() -> CsvRow {
        CsvRow::new(
            2,
            vec![
                ("org_name".into(), "Отдел & Co".into()),
                ("object_uid".into(), OBJECT.into()),
            ],
        )
    }

    fn render_document(config: &AppConfig, rows: &[CsvRow]) -> String {
        let generator = XmlGenerator::new(config);
        let mut doc = generator.begin(Vec::new()).unwrap();
        doc.add_full_model(
            "1.0.0",
            "Access",
            OffsetDateTime::from_unix_timestamp(0).unwrap(),
        )
        .unwrap();
        for r in rows {
            doc.add_role_structure(r, FOLDER).unwrap();
        }
        String::from_utf8(doc.finish().unwrap()).unwrap()
    }

    fn assert_well_formed(xml: &str) {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => panic!("malformed XML: {err}"),
            }
        }
    }

    #[test]
    fn document_declares_namespaces_and_full_model() {
        let xml = render_document(&AppConfig::default(), &[]);

        assert_well_formed(&xml);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains(&format!("xmlns:rdf=\"{}\"", crate::config::RDF_NS)));
        assert!(xml.contains(&format!("xmlns:cim=\"{}\"", crate::config::CIM_NS)));
        assert!(xml.contains("<md:Model.created>1970-01-01T00:00:00Z</md:Model.created>"));
        assert!(xml.contains("<md:Model.version>1.0.0</md:Model.version>"));
        assert!(xml.contains("<md:Model.name>Access</md:Model.name>"));
    }

    #[test]
    fn me_namespace_moves_model_name() {
        let mut config = AppConfig::default();
        config.xml_generation.me_namespace = Some("http://example.com/me#".into());

        let xml = render_document(&config, &[]);

        assert_well_formed(&xml);
        assert!(xml.contains(
            "<me:Model.name xmlns:me=\"http://example.com/me#\">Access</me:Model.name>"
        ));
        assert!(!xml.contains("md:Model.name"));
    }

    #[test]
    fn role_structure_links_all_four_nodes() {
        let config = AppConfig::default();
        let generator = XmlGenerator::new(&config);
        let mut doc = generator.begin(Vec::new()).unwrap();
        let ids = doc.add_role_structure(&row(), FOLDER).unwrap();
        let xml = String::from_utf8(doc.finish().unwrap()).unwrap();

        assert_well_formed(&xml);
        assert!(xml.contains(&format!("<cim:Role rdf:about=\"#_{}\">", ids.role)));
        assert!(xml.contains(&format!(
            "<cim:IdentifiedObject.ParentObject rdf:resource=\"#_{FOLDER}\"/>"
        )));
        assert!(xml.contains(&format!(
            "<cim:Role.Privileges rdf:resource=\"#_{}\"/>",
            ids.privilege
        )));
        assert!(xml.contains(&format!(
            "<cim:Privilege.DataItems rdf:resource=\"#_{}\"/>",
            ids.datagroup
        )));
        assert!(xml.contains(&format!(
            "<cim:DataGroup.Objects rdf:resource=\"#_{}\"/>",
            ids.object_reference
        )));
        assert!(xml.contains(&format!(
            "<cim:ObjectReference.objectUid>{OBJECT}</cim:ObjectReference.objectUid>"
        )));
        assert!(xml.contains("<cim:Role.kind rdf:resource=\"cim:RoleKind.allow\"/>"));
        assert!(xml.contains(&format!(
            "<cim:Privilege.Operation rdf:resource=\"{}\"/>",
            config.xml_generation.fixed_resources.privilege_operation
        )));
    }

    #[test]
    fn names_are_rendered_and_escaped() {
        let xml = render_document(&AppConfig::default(), &[row()]);

        assert!(xml.contains(
            "<cim:IdentifiedObject.name>Роль Отдел &amp; Co</cim:IdentifiedObject.name>"
        ));
        assert!(xml.contains(
            "<cim:IdentifiedObject.name>Группа Отдел &amp; Co</cim:IdentifiedObject.name>"
        ));
    }

    #[test]
    fn each_row_gets_fresh_identifiers() {
        let generator = XmlGenerator::new(&AppConfig::default());
        let mut doc = generator.begin(Vec::new()).unwrap();
        let first = doc.add_role_structure(&row(), FOLDER).unwrap();
        let second = doc.add_role_structure(&row(), FOLDER).unwrap();

        assert_ne!(first.role, second.role);
        assert_ne!(first.object_reference, second.object_reference);
    }

    #[test]
    fn row_without_uid_column_is_an_error() {
        let generator = XmlGenerator::new(&AppConfig::default());
        let mut doc = generator.begin(Vec::new()).unwrap();
        let no_uid = CsvRow::new(5, vec![("org_name".into(), "A".into())]);

        let err = doc.add_role_structure(&no_uid, FOLDER).unwrap_err();

        assert!(err.to_string().contains("_uid"));
    }

    #[test]
    fn render_template_handles_escapes_and_case() {
        let r = row();

        assert_eq!(
            render_template("{{{ORG_NAME}}}", &r).unwrap(),
            "{Отдел & Co}"
        );
        assert_eq!(render_template("plain", &r).unwrap(), "plain");
    }

    #[test]
    fn render_template_rejects_unknown_and_unbalanced() {
        let r = row();

        assert!(render_template("{missing}", &r).is_err());
        assert!(render_template("{org_name", &r).is_err());
        assert!(render_template("oops}", &r).is_err());
    }
}
