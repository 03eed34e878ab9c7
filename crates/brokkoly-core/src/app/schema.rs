//! Human readable description of a task's expected payload.

use serde::Serialize;

use crate::domain::{Param, ParamType};
use crate::typed::RegisteredTask;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreprocessorSchema {
    pub name: String,
    pub fields: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSchema {
    pub queue: String,
    pub task: String,
    /// Arguments the task itself receives.
    pub fields: Vec<Param>,
    /// In execution order.
    pub preprocessors: Vec<PreprocessorSchema>,
}

impl TaskSchema {
    pub fn from_registered(task: &RegisteredTask) -> Self {
        Self {
            queue: task.queue().to_string(),
            task: task.name().to_string(),
            fields: task.signature().params().to_vec(),
            preprocessors: task
                .preprocessors()
                .iter()
                .map(|p| PreprocessorSchema {
                    name: p.name().to_string(),
                    fields: p.signature().params().to_vec(),
                })
                .collect(),
        }
    }

    /// Fields a client has to put in `message`: the first preprocessor's
    /// inputs, or the task's own arguments when there is no chain.
    pub fn input_fields(&self) -> &[Param] {
        self.preprocessors
            .first()
            .map(|p| p.fields.as_slice())
            .unwrap_or(self.fields.as_slice())
    }

    pub fn render_html(&self) -> String {
        let queue = escape(&self.queue);
        let task = escape(&self.task);

        let mut inputs = String::new();
        for field in self.input_fields() {
            let name = escape(&field.name);
            let input_type = match field.ty {
                ParamType::Str => "text",
                ParamType::Int | ParamType::Float => "number",
                ParamType::Bool => "checkbox",
            };
            let step = if field.ty == ParamType::Float { r#" step="any""# } else { "" };
            inputs.push_str(&format!(
                "      <label>{name} <small>({ty})</small> \
                 <input name=\"{name}\" type=\"{input_type}\" data-type=\"{ty}\"{step}></label>\n",
                ty = field.ty,
            ));
        }

        let mut chain = String::new();
        for pre in &self.preprocessors {
            chain.push_str(&format!(
                "      <li>{} ({})</li>\n",
                escape(&pre.name),
                describe_fields(&pre.fields)
            ));
        }
        chain.push_str(&format!(
            "      <li>{task} ({})</li>\n",
            describe_fields(&self.fields)
        ));

        format!(
            r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{queue}/{task}</title>
  </head>
  <body>
    <h1>{queue}/{task}</h1>
    <ol class="brokkoly-chain">
{chain}    </ol>
    <form class="brokkoly-form" method="post" action="/{queue}/{task}">
{inputs}      <button type="submit">Enqueue</button>
    </form>
    <pre class="brokkoly-result"></pre>
    <script src="/brokkoly.js"></script>
  </body>
</html>
"#
        )
    }
}

fn describe_fields(fields: &[Param]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", escape(&f.name), f.ty))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
