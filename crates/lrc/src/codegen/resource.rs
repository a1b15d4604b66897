//! Emission of one resource: trait, backing struct, factory, dispatchers,
//! accessors and compute routines.

use super::{CodeWriter, FieldPlan, ResourcePlan, RustType, field_ident, type_expr};

pub fn write(writer: &mut CodeWriter, plan: &ResourcePlan) {
    writer.line(format!("// {}", plan.id));
    writer.blank();
    write_trait(writer, plan);
    writer.blank();
    writer.line(format!("/// Backing struct of the `{}` resource.", plan.id));
    writer.open(format!("pub struct {} {{", plan.struct_name));
    writer.line("inner: Resource,");
    writer.close("}");
    writer.blank();
    write_factory(writer, plan);
    writer.blank();
    write_dispatchers(writer, plan);
    writer.blank();
    write_accessors(writer, plan);
    if plan.computed_fields().next().is_some() {
        writer.blank();
        write_compute_routines(writer, plan);
    }
}

fn write_trait(writer: &mut CodeWriter, plan: &ResourcePlan) {
    writer.doc(&plan.docs.title);
    if !plan.docs.description.is_empty() {
        writer.line("///");
        writer.doc(&plan.docs.description);
    }
    writer.open(format!("pub trait {}: LrResource {{", plan.trait_name));
    for field in &plan.fields {
        writer.doc(&field.docs.title);
        writer.line(format!(
            "fn {}(&self) -> Result<{}, FieldError>;",
            field.ident,
            field.rust_type.signature()
        ));
    }
    writer.close("}");
}

fn write_factory(writer: &mut CodeWriter, plan: &ResourcePlan) {
    let id = format!("{:?}", plan.id);
    writer.line(format!("/// Create a `{}` instance from its arguments.", plan.id));
    writer.open(format!(
        "pub fn {}(runtime: &Runtime, args: Args) -> Result<ResourceRef, FieldError> {{",
        plan.factory
    ));
    writer.open(format!("let res = {} {{", plan.struct_name));
    writer.line(format!("inner: runtime.new_resource({id}),"));
    writer.close("};");
    if plan.has_init_hook {
        writer.line("let (args, existing) = InitHook::init(&res, args)?;");
        writer.open("if let Some(existing) = existing {");
        writer.line("return Ok(existing);");
        writer.close("}");
    }
    writer.line("let mut id = None;");
    writer.open("for (name, value) in args {");
    writer.open("if value.is_null() {");
    writer.line("res.inner.cache().store(&name, CacheEntry::value(value));");
    writer.line("continue;");
    writer.close("}");
    writer.open("match name.as_str() {");
    for field in &plan.fields {
        writer.open(format!("{:?} => {{", field.name));
        writer.open(format!(
            "if !value.conforms_to(&{}) {{",
            type_expr(&field.ty)
        ));
        writer.line(format!(
            "return Err(FieldError::type_mismatch({id}, {:?}, {:?}));",
            field.name,
            field.ty.to_string()
        ));
        writer.close("}");
        writer.close("}");
    }
    writer.open("ID_ARG => {");
    writer.open("let Value::String(value) = value else {");
    writer.line(format!(
        "return Err(FieldError::type_mismatch({id}, ID_ARG, \"string\"));"
    ));
    writer.close("};");
    writer.line("id = Some(value);");
    writer.line("continue;");
    writer.close("}");
    writer.line(format!(
        "_ => return Err(FieldError::unknown_argument({id}, &name)),"
    ));
    writer.close("}");
    if !plan.fields.is_empty() {
        writer.line("res.inner.cache().store(&name, CacheEntry::value(value));");
    }
    writer.close("}");
    writer.open("let id = match id {");
    writer.line("Some(id) => id,");
    writer.line("None => res.id()?,");
    writer.close("};");
    writer.line("res.inner.set_id(id);");
    writer.line("Ok(Arc::new(res))");
    writer.close("}");
}

fn write_dispatchers(writer: &mut CodeWriter, plan: &ResourcePlan) {
    let id = format!("{:?}", plan.id);
    let not_found = format!("_ => Err(FieldError::field_not_found({id}, name)),");

    writer.open(format!("impl LrResource for {} {{", plan.struct_name));
    writer.open("fn mql_resource(&self) -> &Resource {");
    writer.line("&self.inner");
    writer.close("}");
    writer.blank();

    writer.open("fn field(&self, name: &str) -> Result<Value, FieldError> {");
    writer.line(format!("trace!(resource = {id}, field = name; \"Get field\");"));
    writer.open("match name {");
    for field in &plan.fields {
        writer.line(format!(
            "{:?} => {}::{}(self).map({}),",
            field.name,
            plan.trait_name,
            field.ident,
            field.rust_type.to_value()
        ));
    }
    writer.line(&not_found);
    writer.close("}");
    writer.close("}");
    writer.blank();

    writer.open("fn compute(&self, name: &str) -> Result<(), FieldError> {");
    writer.line(format!("trace!(resource = {id}, field = name; \"Compute field\");"));
    writer.open("match name {");
    for field in &plan.fields {
        if field.is_static {
            writer.line(format!("{:?} => Ok(()),", field.name));
        } else {
            writer.line(format!("{:?} => self.{}(),", field.name, field.compute_fn()));
        }
    }
    writer.line(&not_found);
    writer.close("}");
    writer.close("}");
    writer.blank();

    writer.open("fn register(&self, name: &str) -> Result<(), FieldError> {");
    writer.line(format!("trace!(resource = {id}, field = name; \"Register field\");"));
    writer.open("match name {");
    for field in &plan.fields {
        if field.deps.is_empty() {
            writer.line(format!("{:?} => Ok(()),", field.name));
            continue;
        }
        writer.open(format!("{:?} => {{", field.name));
        writer.line("let runtime = self.inner.runtime();");
        for dep in &field.deps {
            writer.line(format!(
                "runtime.watch_and_compute(self, {dep:?}, self, {:?})?;",
                field.name
            ));
        }
        writer.line("Ok(())");
        writer.close("}");
    }
    writer.line(&not_found);
    writer.close("}");
    writer.close("}");
    writer.blank();

    writer.open("fn validate(&self) -> Result<(), FieldError> {");
    let required: Vec<String> = plan
        .static_fields()
        .map(|field| format!("{:?}", field.name))
        .collect();
    if !required.is_empty() {
        writer.open(format!("for field in [{}] {{", required.join(", ")));
        writer.open("if !self.inner.cache().contains(field) {");
        writer.line(format!("return Err(FieldError::no_value({id}, field));"));
        writer.close("}");
        writer.close("}");
    }
    writer.line("Ok(())");
    writer.close("}");
    writer.blank();

    writer.open("fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {");
    writer.line("self");
    writer.close("}");
    writer.close("}");
}

fn write_accessors(writer: &mut CodeWriter, plan: &ResourcePlan) {
    let id = format!("{:?}", plan.id);
    writer.open(format!("impl {} for {} {{", plan.trait_name, plan.struct_name));
    for (index, field) in plan.fields.iter().enumerate() {
        if index > 0 {
            writer.blank();
        }
        let name = format!("{:?}", field.name);
        writer.open(format!(
            "fn {}(&self) -> Result<{}, FieldError> {{",
            field.ident,
            field.rust_type.signature()
        ));

        if field.is_static {
            writer.open(format!("let Some(entry) = self.inner.cache().load({name}) else {{"));
            writer.line(format!("return Err(FieldError::no_value({id}, {name}));"));
            writer.close("};");
        } else if field.deps.is_empty() {
            writer.open(format!("let entry = match self.inner.cache().load({name}) {{"));
            writer.line("Some(entry) => entry,");
            writer.open("None => {");
            writer.line(format!("self.{}()?;", field.compute_fn()));
            writer.line("let entry = self");
            writer.line("    .inner");
            writer.line("    .cache()");
            writer.line(format!("    .load({name})"));
            writer.line(format!("    .ok_or_else(|| FieldError::cache_miss({id}, {name}))?;"));
            writer.line(format!("self.inner.runtime().trigger(self, {name});"));
            writer.line("entry");
            writer.close("}");
            writer.close("};");
        } else {
            writer.open(format!("let Some(entry) = self.inner.cache().load({name}) else {{"));
            writer.line("return Err(FieldError::NotReady);");
            writer.close("};");
        }

        writer.line("let value = entry.into_result()?;");
        let expected = format!("{:?}", field.rust_type.signature());
        match &field.rust_type {
            RustType::Resource(path) => {
                writer.line("value");
                writer.line(format!("    .into_resource::<{path}>()"));
                writer.line(format!(
                    "    .ok_or_else(|| FieldError::cast_failed({id}, {name}, {expected}))"
                ));
            }
            RustType::Value(_) | RustType::Embedded => {
                writer.line("FromValue::from_value(value)");
                writer.line(format!(
                    "    .ok_or_else(|| FieldError::cast_failed({id}, {name}, {expected}))"
                ));
            }
        }
        writer.close("}");
    }
    writer.close("}");
}

fn write_compute_routines(writer: &mut CodeWriter, plan: &ResourcePlan) {
    writer.open(format!("impl {} {{", plan.struct_name));
    for (index, field) in plan.computed_fields().enumerate() {
        if index > 0 {
            writer.blank();
        }
        let name = format!("{:?}", field.name);
        let deps: Vec<&FieldPlan> = field
            .deps
            .iter()
            .filter_map(|dep| plan.field(dep))
            .collect();
        let params: String = deps
            .iter()
            .map(|dep| format!(", {}: {}", field_ident(&dep.name), dep.rust_type.signature()))
            .collect();
        writer.line(format!(
            "/// Compute `{}` with `{}(&self{params}) -> Result<{}, FieldError>`.",
            field.name,
            field.getter(),
            field.rust_type.signature()
        ));
        writer.open(format!(
            "pub fn {}(&self) -> Result<(), FieldError> {{",
            field.compute_fn()
        ));

        if field.deps.is_empty() {
            writer.open(format!("match self.inner.cache().claim({name}) {{"));
            writer.line("Claim::Acquired => {}");
            writer.line("Claim::Present => return Ok(()),");
            writer.line("Claim::InFlight => return Err(FieldError::NotReady),");
            writer.close("}");
        } else {
            writer.open(format!(
                "if self.inner.cache().reclaim({name}) == Claim::InFlight {{"
            ));
            writer.line("return Err(FieldError::NotReady);");
            writer.close("}");
            for dep in &deps {
                writer.open(format!(
                    "let arg_{} = match {}::{}(self) {{",
                    dep.snake, plan.trait_name, dep.ident
                ));
                writer.line("Ok(value) => value,");
                writer.line(format!("Err(err) => return self.inner.fail({name}, err),"));
                writer.close("};");
            }
        }

        let args: String = deps
            .iter()
            .map(|dep| format!("arg_{}", dep.snake))
            .collect::<Vec<_>>()
            .join(", ");
        writer.line(format!("let result = self.{}({args});", field.getter()));
        writer.line(format!(
            "self.inner.finish({name}, result.map({}))",
            field.rust_type.to_value()
        ));
        writer.close("}");
    }
    writer.close("}");
}
