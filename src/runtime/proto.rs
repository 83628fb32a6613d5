//! Prototype chains and subtyping
//!
//! Every lookup that follows prototype links is bounded by the configured
//! `max_prototype_depth`; a chain longer than that is treated as malformed
//! and reported as an `Exception`.

use tracing::warn;

use crate::context::DynContext;
use crate::error::{DynError, DynResult};
use crate::runtime::object::{JSObject, ObjectRef};
use crate::runtime::property::{PropertyFlags, PropertySlot};
use crate::util::parse_array_index;
use crate::value::{DynValue, Value};

/// A property found on an object or one of its prototypes
#[derive(Debug, Clone)]
pub(crate) struct FoundProperty {
    pub slot: PropertySlot,
    pub flags: PropertyFlags,
    /// Found on the receiver itself rather than a prototype
    pub own: bool,
}

/// Own property of one object, including the virtual properties of arrays
pub(crate) fn own_property(obj: &JSObject, name: &str) -> Option<(PropertySlot, PropertyFlags)> {
    if let Some(arr) = obj.as_array() {
        if name == "length" {
            let flags = PropertyFlags::from_bits(PropertyFlags::WRITABLE);
            return Some((PropertySlot::Data(Value::Number(arr.len() as f64)), flags));
        }
        if let Some(elem) = parse_array_index(name).and_then(|idx| arr.get(idx)) {
            return Some((PropertySlot::Data(elem.clone()), PropertyFlags::DEFAULT));
        }
    }
    obj.props()
        .get(name)
        .map(|prop| (prop.slot().clone(), prop.flags()))
}

impl DynContext {
    /// Find a property on `obj` or its prototype chain
    pub(crate) fn lookup_property(
        &self,
        obj: &ObjectRef,
        name: &str,
    ) -> DynResult<Option<FoundProperty>> {
        let mut cur = obj.clone();
        let mut depth = 0;
        loop {
            let next = {
                let o = cur.borrow();
                if let Some((slot, flags)) = own_property(&o, name) {
                    return Ok(Some(FoundProperty {
                        slot,
                        flags,
                        own: depth == 0,
                    }));
                }
                o.proto().cloned()
            };
            match next {
                Some(proto) => {
                    depth += 1;
                    self.check_depth(depth)?;
                    cur = proto;
                }
                None => return Ok(None),
            }
        }
    }

    fn check_depth(&self, depth: usize) -> DynResult<()> {
        if depth > self.config().max_prototype_depth {
            warn!(depth, "prototype chain exceeds the configured depth");
            return Err(DynError::exception("prototype chain too deep"));
        }
        Ok(())
    }

    /// Create an object whose prototype is `proto` (an object or null)
    pub fn new_object_with_proto(&self, proto: &DynValue) -> DynResult<DynValue> {
        let proto = match proto.value() {
            Value::Object(p) => Some(p.clone()),
            Value::Null => None,
            _ => return Err(DynError::type_error("prototype must be an object or null")),
        };
        Ok(DynValue::new(Value::Object(ObjectRef::new(JSObject::new(proto)))))
    }

    /// Replace the prototype of `obj`
    ///
    /// Setting the prototype of a primitive is accepted and has no effect.
    pub fn set_prototype(&self, obj: &DynValue, proto: &DynValue) -> DynResult<()> {
        if obj.is_undefined() || obj.is_null() {
            return Err(DynError::type_error("cannot set prototype of null or undefined"));
        }
        let proto = match proto.value() {
            Value::Object(p) => Some(p),
            Value::Null => None,
            _ => return Err(DynError::type_error("prototype must be an object or null")),
        };
        let Some(target) = obj.as_object() else {
            return Ok(());
        };

        if let Some(proto) = proto {
            // Refuse links that would close a cycle
            let mut cur = Some(proto.clone());
            let mut depth = 0;
            while let Some(p) = cur {
                if p.ptr_eq(target) {
                    return Err(DynError::exception("circular prototype chain"));
                }
                depth += 1;
                self.check_depth(depth)?;
                cur = p.borrow().proto().cloned();
            }
        }

        target.borrow_mut().set_proto(proto.cloned());
        Ok(())
    }

    /// Prototype of `obj`, `null` at the end of a chain
    pub fn get_prototype(&self, obj: &DynValue) -> DynResult<DynValue> {
        if obj.is_undefined() || obj.is_null() {
            return Err(DynError::type_error("cannot read prototype of null or undefined"));
        }
        let proto = obj.as_object().and_then(|o| o.borrow().proto().cloned());
        Ok(match proto {
            Some(p) => DynValue::new(Value::Object(p)),
            None => self.new_null(),
        })
    }

    /// Own property value, ignoring prototypes
    ///
    /// Accessor properties read as `undefined`.
    pub fn get_own_property(&self, obj: &DynValue, name: &str) -> DynResult<Option<DynValue>> {
        let target = obj
            .as_object()
            .ok_or_else(|| DynError::type_error("not an object"))?;
        let own = own_property(&target.borrow(), name);
        Ok(own.map(|(slot, _)| match slot {
            PropertySlot::Data(v) => DynValue::new(v),
            PropertySlot::Accessor { .. } => self.new_undefined(),
        }))
    }

    /// Check if `dst` appears on the prototype chain of `src`
    ///
    /// `dst` is either a function (its `prototype` property is looked for)
    /// or an object used directly as the prototype to find.
    pub fn instanceof(&self, src: &DynValue, dst: &DynValue) -> DynResult<bool> {
        let dst_obj = dst
            .as_object()
            .ok_or_else(|| DynError::type_error("right-hand side of instanceof is not an object"))?;

        let target = if dst.is_function() {
            match self.get_property(dst, "prototype")? {
                Some(p) => match p.as_object() {
                    Some(o) => o.clone(),
                    None => {
                        return Err(DynError::type_error("function has no prototype object"));
                    }
                },
                None => return Ok(false),
            }
        } else {
            dst_obj.clone()
        };

        let Some(src) = src.as_object() else {
            return Ok(false);
        };

        let mut cur = src.borrow().proto().cloned();
        let mut depth = 0;
        while let Some(p) = cur {
            if p.ptr_eq(&target) {
                return Ok(true);
            }
            depth += 1;
            self.check_depth(depth)?;
            cur = p.borrow().proto().cloned();
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EngineConfig;

    #[test]
    fn test_inherited_property() {
        let ctx = DynContext::new();
        let p = ctx.new_object();
        ctx.set_property(&p, "name", &ctx.new_string("Jack")).unwrap();
        let o = ctx.new_object_with_proto(&p).unwrap();

        assert!(ctx.has_property(&o, "name").unwrap());
        assert!(ctx.get_own_property(&o, "name").unwrap().is_none());
        let name = ctx.get_property(&o, "name").unwrap().unwrap();
        assert_eq!(name.as_str(), Some("Jack"));
        assert_eq!(
            ctx.get_own_property(&p, "name").unwrap().unwrap().as_str(),
            Some("Jack")
        );
    }

    #[test]
    fn test_new_object_with_proto_rejects_primitives() {
        let ctx = DynContext::new();
        assert!(ctx.new_object_with_proto(&ctx.new_null()).is_ok());
        assert!(matches!(
            ctx.new_object_with_proto(&ctx.new_number(1.0)),
            Err(DynError::TypeError(_))
        ));
    }

    #[test]
    fn test_set_prototype_errors() {
        let ctx = DynContext::new();
        let obj = ctx.new_object();
        assert!(matches!(
            ctx.set_prototype(&ctx.new_null(), &obj),
            Err(DynError::TypeError(_))
        ));
        assert!(matches!(
            ctx.set_prototype(&ctx.new_undefined(), &obj),
            Err(DynError::TypeError(_))
        ));
        assert!(matches!(
            ctx.set_prototype(&obj, &ctx.new_string("p")),
            Err(DynError::TypeError(_))
        ));
        assert!(ctx.set_prototype(&ctx.new_number(1.0), &obj).is_ok());
    }

    #[test]
    fn test_set_and_get_prototype() {
        let ctx = DynContext::new();
        let obj = ctx.new_object();
        let proto = ctx.new_object();
        assert!(ctx.get_prototype(&obj).unwrap().is_null());

        ctx.set_prototype(&obj, &proto).unwrap();
        let got = ctx.get_prototype(&obj).unwrap();
        assert!(got.as_object().unwrap().ptr_eq(proto.as_object().unwrap()));

        ctx.set_prototype(&obj, &ctx.new_null()).unwrap();
        assert!(ctx.get_prototype(&obj).unwrap().is_null());
        assert!(ctx.get_prototype(&ctx.new_null()).is_err());
    }

    #[test]
    fn test_cycle_rejected() {
        let ctx = DynContext::new();
        let a = ctx.new_object();
        let b = ctx.new_object_with_proto(&a).unwrap();
        assert!(matches!(
            ctx.set_prototype(&a, &b),
            Err(DynError::Exception(_))
        ));
        assert!(matches!(ctx.set_prototype(&a, &a), Err(DynError::Exception(_))));
    }

    #[test]
    fn test_depth_limit() {
        let config = EngineConfig {
            max_prototype_depth: 3,
            ..EngineConfig::default()
        };
        let ctx = DynContext::with_config(config);
        let mut cur = ctx.new_object();
        ctx.set_property(&cur, "root", &ctx.new_boolean(true)).unwrap();
        for _ in 0..5 {
            cur = ctx.new_object_with_proto(&cur).unwrap();
        }
        assert!(matches!(
            ctx.has_property(&cur, "root"),
            Err(DynError::Exception(_))
        ));
        let base = ctx.new_object();
        assert!(matches!(
            ctx.instanceof(&cur, &base),
            Err(DynError::Exception(_))
        ));
    }

    #[test]
    fn test_instanceof_object() {
        let ctx = DynContext::new();
        let base = ctx.new_object();
        let mid = ctx.new_object_with_proto(&base).unwrap();
        let leaf = ctx.new_object_with_proto(&mid).unwrap();

        assert!(ctx.instanceof(&leaf, &base).unwrap());
        assert!(ctx.instanceof(&leaf, &mid).unwrap());
        assert!(!ctx.instanceof(&base, &leaf).unwrap());
        assert!(!ctx.instanceof(&leaf, &leaf).unwrap());
        assert!(!ctx.instanceof(&ctx.new_number(1.0), &base).unwrap());
        assert!(ctx.instanceof(&leaf, &ctx.new_number(1.0)).is_err());
    }

    fn noop(ctx: &DynContext, _this: &DynValue, _args: &[DynValue]) -> DynResult<DynValue> {
        Ok(ctx.new_undefined())
    }

    #[test]
    fn test_instanceof_function() {
        let ctx = DynContext::new();
        let ctor = ctx.new_native_function("Point", noop);
        let proto = ctx.new_object();
        ctx.set_property(&ctor, "prototype", &proto).unwrap();

        let point = ctx.new_object_with_proto(&proto).unwrap();
        assert!(ctx.instanceof(&point, &ctor).unwrap());
        assert!(!ctx.instanceof(&ctx.new_object(), &ctor).unwrap());

        let bare = ctx.new_native_function("Bare", noop);
        assert!(!ctx.instanceof(&point, &bare).unwrap());
    }
}
