//! Command values sent to a speaker
//!
//! A [`Command`] is an immutable description of one device call: the
//! namespace it is addressed to, the method name, its arguments and the
//! name of the pushed message that answers it. The command catalogue in
//! [`crate::commands`] builds these; the client turns them into a request
//! line with [`Command::url`].

use std::fmt;

use quick_xml::escape::escape;
use url::form_urlencoded;

/// Protocol namespace a command is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Speaker control: volume, source, grouping, equalizer
    Uic,
    /// Content provider control: TuneIn, Spotify and other apps
    Cpm,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Uic => "UIC",
            Namespace::Cpm => "CPM",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a command argument, tagged with its wire encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Str(String),
    Dec(i64),
    /// Free text wrapped in a CDATA section
    Cdata(String),
    StrArray(Vec<String>),
    DecArray(Vec<i64>),
}

impl ArgValue {
    /// Type tag written in the `type` attribute of the `<p>` element
    pub fn type_tag(&self) -> &'static str {
        match self {
            ArgValue::Str(_) => "str",
            ArgValue::Dec(_) => "dec",
            ArgValue::Cdata(_) => "cdata",
            ArgValue::StrArray(_) => "str_arr",
            ArgValue::DecArray(_) => "dec_arr",
        }
    }
}

/// A named command argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub name: String,
    pub value: ArgValue,
}

impl Arg {
    pub fn str(name: &str, value: impl Into<String>) -> Self {
        Self { name: name.to_string(), value: ArgValue::Str(value.into()) }
    }

    pub fn dec(name: &str, value: i64) -> Self {
        Self { name: name.to_string(), value: ArgValue::Dec(value) }
    }

    pub fn cdata(name: &str, value: impl Into<String>) -> Self {
        Self { name: name.to_string(), value: ArgValue::Cdata(value.into()) }
    }

    pub fn str_array(name: &str, values: Vec<String>) -> Self {
        Self { name: name.to_string(), value: ArgValue::StrArray(values) }
    }

    pub fn dec_array(name: &str, values: Vec<i64>) -> Self {
        Self { name: name.to_string(), value: ArgValue::DecArray(values) }
    }

    fn write_markup(&self, out: &mut String) {
        let tag = self.value.type_tag();
        match &self.value {
            ArgValue::Str(value) => {
                out.push_str(&format!(
                    r#"<p type="{tag}" name="{}" val="{}"/>"#,
                    self.name,
                    escape(value.as_str())
                ));
            }
            ArgValue::Dec(value) => {
                out.push_str(&format!(r#"<p type="{tag}" name="{}" val="{value}"/>"#, self.name));
            }
            ArgValue::Cdata(value) => {
                out.push_str(&format!(
                    r#"<p type="{tag}" name="{}" val="empty"><![CDATA[{value}]]></p>"#,
                    self.name
                ));
            }
            ArgValue::StrArray(values) => {
                out.push_str(&format!(r#"<p type="{tag}" name="{}" val="empty">"#, self.name));
                for value in values {
                    out.push_str(&format!("<item>{}</item>", escape(value.as_str())));
                }
                out.push_str("</p>");
            }
            ArgValue::DecArray(values) => {
                out.push_str(&format!(r#"<p type="{tag}" name="{}" val="empty">"#, self.name));
                for value in values {
                    out.push_str(&format!("<item>{value}</item>"));
                }
                out.push_str("</p>");
            }
        }
    }
}

/// One device call
///
/// Built once, consumed once by the client. `expected_reply` names the
/// pushed message that resolves the call; commands without one are
/// fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    namespace: Namespace,
    method: String,
    power_on: bool,
    args: Vec<Arg>,
    expected_reply: Option<String>,
    requester_scoped: bool,
    timeout_multiple: u32,
}

impl Command {
    pub fn new(namespace: Namespace, method: &str) -> Self {
        Self {
            namespace,
            method: method.to_string(),
            power_on: false,
            args: Vec::new(),
            expected_reply: None,
            requester_scoped: false,
            timeout_multiple: 1,
        }
    }

    /// Command addressed to the speaker control namespace
    pub fn uic(method: &str) -> Self {
        Self::new(Namespace::Uic, method)
    }

    /// Command addressed to the content provider namespace
    pub fn cpm(method: &str) -> Self {
        Self::new(Namespace::Cpm, method)
    }

    /// Wake the speaker before executing the command
    pub fn with_power_on(mut self) -> Self {
        self.power_on = true;
        self
    }

    pub fn with_arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn expecting(mut self, reply: &str) -> Self {
        self.expected_reply = Some(reply.to_string());
        self
    }

    /// Only accept a reply addressed to this client's identity token
    pub fn with_requester_scope(mut self) -> Self {
        self.requester_scoped = true;
        self
    }

    /// Scale the client's request timeout for slow commands
    pub fn with_timeout_multiple(mut self, multiple: u32) -> Self {
        self.timeout_multiple = multiple.max(1);
        self
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn power_on(&self) -> bool {
        self.power_on
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn expected_reply(&self) -> Option<&str> {
        self.expected_reply.as_deref()
    }

    pub fn requester_scoped(&self) -> bool {
        self.requester_scoped
    }

    pub fn timeout_multiple(&self) -> u32 {
        self.timeout_multiple
    }

    /// Unencoded markup carried in the `cmd` query parameter
    pub fn markup(&self) -> String {
        let mut out = String::new();
        if self.power_on {
            out.push_str("<pwron>on</pwron>");
        }
        out.push_str(&format!("<name>{}</name>", self.method));
        for arg in &self.args {
            arg.write_markup(&mut out);
        }
        out
    }

    /// Request target, e.g. `/UIC?cmd=%3Cname%3EGetVolume%3C%2Fname%3E`
    pub fn url(&self) -> String {
        let encoded: String = form_urlencoded::byte_serialize(self.markup().as_bytes()).collect();
        // The device does not treat '+' as a space.
        format!("/{}?cmd={}", self.namespace, encoded.replace('+', "%20"))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.method)
    }
}
