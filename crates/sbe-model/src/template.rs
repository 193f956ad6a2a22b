//! Positional message templates.
//!
//! Placeholders take the form `{index}` or `{index,format...}`; the format
//! suffix (for example `number,integer`) is accepted and ignored since
//! arguments already carry their type. Placeholders that reference a missing
//! argument, or that are not well formed, are emitted verbatim.

use std::fmt::Write;

use crate::event::EventArg;

pub fn render_template(template: &str, args: &[EventArg]) -> String {
    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let spec = &after[..close];
        let index = spec.split(',').next().unwrap_or("").trim();
        match index.parse::<usize>().ok().and_then(|i| args.get(i)) {
            Some(arg) => {
                let _ = write!(out, "{arg}");
            }
            None => {
                out.push('{');
                out.push_str(spec);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_plain_and_formatted_placeholders() {
        let args = vec![EventArg::Integer(0), EventArg::Integer(2), EventArg::Integer(5)];
        assert_eq!(
            render_template(
                "fatal errors={0,number,integer} errors={1,number,integer} warnings={2}",
                &args
            ),
            "fatal errors=0 errors=2 warnings=5"
        );
    }

    #[test]
    fn keeps_unknown_placeholders() {
        let args = vec![EventArg::Text("x".to_string())];
        assert_eq!(render_template("{0} {1} {name}", &args), "x {1} {name}");
    }

    #[test]
    fn keeps_unterminated_brace() {
        assert_eq!(render_template("value {0", &[]), "value {0");
    }

    #[test]
    fn text_arguments_are_not_reinterpreted() {
        let args = vec![EventArg::Text("{1}".to_string()), EventArg::Integer(9)];
        assert_eq!(render_template("{0}-{1}", &args), "{1}-9");
    }
}
