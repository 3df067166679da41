use super::{placeholder, user_ref, Compile};
use crate::context::CompileContext;
use crate::document::CorrelationIdDecl;
use crate::error::CompileError;
use crate::model::{Capability, CorrelationId, MessageField, ObjectKind, Renderer};
use std::rc::Rc;

impl Compile for CorrelationIdDecl {
    fn compile(&self, ctx: &mut CompileContext<'_>) -> Result<Rc<dyn Renderer>, CompileError> {
        if self.x_ignore || !ctx.options.messages.enable {
            return Ok(placeholder(ctx, ObjectKind::CorrelationId));
        }
        if let Some(raw) = &self.reference {
            return user_ref(ctx, raw, Capability::CorrelationId, false);
        }

        let (field, location) = parse_location(&self.location).map_err(|msg| ctx.error(msg))?;
        log::trace!("correlation id on {} at {:?}", field.as_str(), location);

        Ok(Rc::new(CorrelationId {
            id: ctx.here(),
            name: ctx.path.top_segment().to_owned(),
            description: self.description.clone(),
            field,
            location,
        }))
    }
}

/// Validate a runtime expression such as `$message.header#/correlationId`
/// and split it into the message field and the path below it.
pub fn parse_location(location: &str) -> Result<(MessageField, Vec<String>), String> {
    let Some((source, fragment)) = location.split_once('#') else {
        return Err("no fragment part in location".to_owned());
    };

    let field = if source.ends_with("header") {
        MessageField::Headers
    } else if source.ends_with("payload") {
        MessageField::Payload
    } else {
        return Err("location source must point only to header or payload".to_owned());
    };

    let Some(pointer) = fragment.strip_prefix('/') else {
        return Err("fragment part must start with a slash".to_owned());
    };
    if pointer.is_empty() {
        return Err("location must not point to root of message/header".to_owned());
    }

    let path = pointer
        .split('/')
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect();
    Ok((field, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_location() {
        let (field, path) = parse_location("$message.header#/correlationId").unwrap();
        assert_eq!(field, MessageField::Headers);
        assert_eq!(path, ["correlationId"]);
    }

    #[test]
    fn nested_payload_location() {
        let (field, path) = parse_location("$message.payload#/meta/trace~1id").unwrap();
        assert_eq!(field, MessageField::Payload);
        assert_eq!(path, ["meta", "trace/id"]);
    }

    #[test]
    fn missing_fragment() {
        assert_eq!(
            parse_location("$message.header").unwrap_err(),
            "no fragment part in location"
        );
    }

    #[test]
    fn wrong_source() {
        assert!(parse_location("$message.body#/id")
            .unwrap_err()
            .contains("header or payload"));
    }

    #[test]
    fn fragment_without_slash() {
        assert!(parse_location("$message.payload#id")
            .unwrap_err()
            .contains("start with a slash"));
    }

    #[test]
    fn root_fragment() {
        assert!(parse_location("$message.payload#/")
            .unwrap_err()
            .contains("root"));
    }
}
