//! Raw text stage

use super::{Loader, LoaderContext, PulledState};
use crate::error::LoaderResult;

/// Strips the trailing line endings on pull and puts the source document's
/// ending back on push, so targets end exactly the way the source does
/// (`\n`, `\r\n`, several blank lines, or nothing at all).
#[derive(Debug, Default)]
pub struct TextFileLoader {
    ending: PulledState<String>,
}

impl TextFileLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Loader for TextFileLoader {
    type Input = String;
    type Output = String;

    fn name(&self) -> &'static str {
        "text-file"
    }

    fn pull(
        &mut self,
        locale: &str,
        input: String,
        ctx: &mut LoaderContext,
    ) -> LoaderResult<String> {
        let body_len = input.trim_end_matches(['\r', '\n']).len();
        self.ending
            .record(locale, ctx, input[body_len..].to_string());

        let mut body = input;
        body.truncate(body_len);
        Ok(body)
    }

    fn push(
        &mut self,
        _locale: &str,
        data: String,
        _ctx: &mut LoaderContext,
    ) -> LoaderResult<String> {
        let ending = self.ending.get(self.name())?;
        let mut output = data.trim_end_matches(['\r', '\n']).to_string();
        output.push_str(ending);
        Ok(output)
    }
}
