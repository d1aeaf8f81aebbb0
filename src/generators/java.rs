//! Spring Boot emitter.

use std::path::PathBuf;

use super::naming::{camel_case, kebab_case, lower_first, upper_first};
use super::template::render;
use super::{guideline_comment, CodeEmitter, GeneratedFile};
use crate::error::AppError;
use crate::models::{Component, ComponentKind, TableSchema};
use crate::services::MigrationContext;

const CONTROLLER_TEMPLATE: &str = r#"package {{package}}.controller;

import org.springframework.http.ResponseEntity;
import org.springframework.web.bind.annotation.*;
import lombok.RequiredArgsConstructor;
import {{package}}.dto.{{dto_type}};
import java.util.List;

// Migrated from {{source_path}}
@RestController
@RequestMapping("/{{endpoint}}")
@RequiredArgsConstructor
public class {{class_name}} {

{{fields}}
{{legacy_actions}}
    @GetMapping
    public ResponseEntity<List<{{dto_type}}>> getAll() {
        return ResponseEntity.ok({{service_var}}.findAll());
    }

    @GetMapping("/{id}")
    public ResponseEntity<{{dto_type}}> getById(@PathVariable {{id_type}} id) {
        return {{service_var}}.findById(id)
            .map(ResponseEntity::ok)
            .orElse(ResponseEntity.notFound().build());
    }

    @PostMapping
    public ResponseEntity<{{dto_type}}> create(@RequestBody {{dto_type}} dto) {
        return ResponseEntity.ok({{service_var}}.save(dto));
    }

    @PutMapping("/{id}")
    public ResponseEntity<{{dto_type}}> update(@PathVariable {{id_type}} id, @RequestBody {{dto_type}} dto) {
        return ResponseEntity.ok({{service_var}}.update(id, dto));
    }

    @DeleteMapping("/{id}")
    public ResponseEntity<Void> delete(@PathVariable {{id_type}} id) {
        {{service_var}}.delete(id);
        return ResponseEntity.noContent().build();
    }
}
"#;

const SERVICE_TEMPLATE: &str = r#"package {{package}}.service;

import org.springframework.stereotype.Service;
import lombok.RequiredArgsConstructor;
import {{package}}.repository.{{repository}};
import java.util.List;
import java.util.Optional;

// Migrated from {{source_path}}
@Service
@RequiredArgsConstructor
public class {{class_name}} {
    private final {{repository}} {{repository_var}};

    public List<{{entity}}> findAll() {
        return {{repository_var}}.findAll();
    }

    public Optional<{{entity}}> findById({{id_type}} id) {
        return {{repository_var}}.findById(id);
    }

    public {{entity}} save({{entity}} entity) {
        return {{repository_var}}.save(entity);
    }

    public {{entity}} update({{id_type}} id, {{entity}} entity) {
        entity.setId(id);
        return {{repository_var}}.save(entity);
    }

    public void delete({{id_type}} id) {
        {{repository_var}}.deleteById(id);
    }
}
"#;

const REPOSITORY_TEMPLATE: &str = r#"package {{package}}.repository;

import org.springframework.data.jpa.repository.JpaRepository;
import org.springframework.stereotype.Repository;
{{imports}}
// Migrated from {{source_path}}
@Repository
public interface {{class_name}} extends JpaRepository<{{entity}}, {{id_type}}> {
{{finders}}}
"#;

const DTO_TEMPLATE: &str = r#"package {{package}}.dto;

import lombok.Data;
{{imports}}
@Data
public class {{class_name}} {
{{fields}}
}
"#;

const ID_TYPE: &str = "Long";

/// Maps a legacy SQL column type onto a Java field type.
///
/// Length and precision suffixes (`varchar(50)`, `decimal(18,2)`) are ignored;
/// unknown types map to `String`.
pub fn java_type(sql_type: &str) -> &'static str {
    let base = sql_type
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match base.as_str() {
        "int" | "integer" | "int4" | "serial" => "Integer",
        "bigint" | "int8" | "bigserial" => "Long",
        "smallint" | "int2" | "tinyint" => "Short",
        "bit" | "bool" | "boolean" => "Boolean",
        "decimal" | "numeric" | "money" | "smallmoney" => "BigDecimal",
        "float" | "double precision" | "float8" | "real" | "float4" => "Double",
        "date" => "LocalDate",
        "datetime" | "datetime2" | "smalldatetime" | "timestamp"
        | "timestamp without time zone" | "timestamp with time zone" | "timestamptz" => {
            "LocalDateTime"
        }
        "uniqueidentifier" | "uuid" => "UUID",
        _ => "String",
    }
}

fn java_import(java_type: &str) -> Option<&'static str> {
    match java_type {
        "BigDecimal" => Some("import java.math.BigDecimal;"),
        "LocalDate" => Some("import java.time.LocalDate;"),
        "LocalDateTime" => Some("import java.time.LocalDateTime;"),
        "UUID" => Some("import java.util.UUID;"),
        _ => None,
    }
}

/// One Java field derived from a column or a legacy property.
struct Field {
    name: String,
    java_type: &'static str,
}

fn fields_from_table(table: &TableSchema) -> Vec<Field> {
    table
        .columns
        .iter()
        .map(|column| Field {
            name: camel_case(&column.name),
            java_type: java_type(&column.data_type),
        })
        .collect()
}

/// Import block for the non-`java.lang` types among `fields`, one per line.
fn imports_for(fields: &[Field]) -> String {
    let mut imports: Vec<&str> = fields.iter().filter_map(|f| java_import(f.java_type)).collect();
    imports.sort_unstable();
    imports.dedup();
    imports.iter().map(|line| format!("{}\n", line)).collect()
}

/// Emits Spring Boot controllers, services, repositories and DTOs.
///
/// Files are placed under `src/main/java/<package path>/<layer>/`, relative
/// to the backend project root.
#[derive(Debug, Default, Clone, Copy)]
pub struct JavaEmitter;

impl JavaEmitter {
    pub fn new() -> Self {
        Self
    }

    fn file(&self, package: &str, layer: &str, class_name: &str, contents: String) -> GeneratedFile {
        let mut path = PathBuf::from("src/main/java");
        path.extend(package.split('.').filter(|segment| !segment.is_empty()));
        path.push(layer);
        path.push(format!("{}.java", class_name));
        GeneratedFile { path, contents }
    }

    fn controller(
        &self,
        component: &Component,
        context: &MigrationContext,
    ) -> Result<Vec<GeneratedFile>, AppError> {
        let package = context.target_package.as_str();
        let entity = entity_name(&component.name, "Controller")?;
        let dto_type = format!("{}DTO", entity);
        let service_type = format!("{}Service", entity);
        let service_var = lower_first(&service_type);
        let endpoint = kebab_case(&entity);

        let mut services: Vec<&str> = context
            .dependencies
            .iter()
            .map(|dep| dep.name.as_str())
            .filter(|name| name.contains("Service"))
            .collect();
        if !services.contains(&service_type.as_str()) {
            services.insert(0, &service_type);
        }
        let fields = services
            .iter()
            .map(|name| {
                format!(
                    "    private final {}.service.{} {};",
                    package,
                    name,
                    lower_first(name)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let legacy_actions = if context.methods.is_empty() {
            String::new()
        } else {
            format!("\n    // Legacy actions: {}\n", context.methods.join(", "))
        };

        let controller = render(
            CONTROLLER_TEMPLATE,
            &[
                ("package", package),
                ("source_path", component.file_path.as_str()),
                ("endpoint", endpoint.as_str()),
                ("class_name", component.name.as_str()),
                ("fields", fields.as_str()),
                ("legacy_actions", legacy_actions.as_str()),
                ("dto_type", dto_type.as_str()),
                ("service_var", service_var.as_str()),
                ("id_type", ID_TYPE),
            ],
        )?;

        let mut files = vec![self.file(package, "controller", &component.name, controller)];

        // A migrated model of the same name owns the DTO file.
        if context.migrated_models.iter().any(|model| *model == entity) {
            tracing::debug!(controller = %component.name, "Model {} provides {}", entity, dto_type);
        } else {
            let dto_fields = context
                .matched_table_schemas
                .first()
                .map(fields_from_table)
                .unwrap_or_default();
            files.push(self.dto(package, &dto_type, &dto_fields)?);
        }
        Ok(files)
    }

    fn service(
        &self,
        component: &Component,
        context: &MigrationContext,
    ) -> Result<Vec<GeneratedFile>, AppError> {
        let package = context.target_package.as_str();
        let entity = entity_name(&component.name, "Service")?;
        let repository = context
            .dependencies
            .iter()
            .map(|dep| dep.name.clone())
            .find(|name| name.ends_with("Repository"))
            .unwrap_or_else(|| format!("{}Repository", entity));
        let repository_var = lower_first(&repository);

        let contents = render(
            SERVICE_TEMPLATE,
            &[
                ("package", package),
                ("source_path", component.file_path.as_str()),
                ("class_name", component.name.as_str()),
                ("repository", repository.as_str()),
                ("repository_var", repository_var.as_str()),
                ("entity", entity.as_str()),
                ("id_type", ID_TYPE),
            ],
        )?;
        Ok(vec![self.file(package, "service", &component.name, contents)])
    }

    fn repository(
        &self,
        component: &Component,
        context: &MigrationContext,
    ) -> Result<Vec<GeneratedFile>, AppError> {
        let package = context.target_package.as_str();
        let entity = entity_name(&component.name, "Repository")?;

        // One finder per non-key column of the backing table.
        let columns: Vec<Field> = context
            .matched_table_schemas
            .first()
            .map(fields_from_table)
            .unwrap_or_default()
            .into_iter()
            .filter(|field| !field.name.eq_ignore_ascii_case("id"))
            .collect();
        let finders: String = columns
            .iter()
            .map(|field| {
                format!(
                    "    List<{}> findBy{}({} {});\n",
                    entity,
                    upper_first(&field.name),
                    field.java_type,
                    field.name
                )
            })
            .collect();
        let mut imports = imports_for(&columns);
        if !columns.is_empty() {
            imports.push_str("import java.util.List;\n");
        }

        let contents = render(
            REPOSITORY_TEMPLATE,
            &[
                ("package", package),
                ("imports", imports.as_str()),
                ("source_path", component.file_path.as_str()),
                ("class_name", component.name.as_str()),
                ("entity", entity.as_str()),
                ("id_type", ID_TYPE),
                ("finders", finders.as_str()),
            ],
        )?;
        Ok(vec![self.file(package, "repository", &component.name, contents)])
    }

    fn model(
        &self,
        component: &Component,
        context: &MigrationContext,
    ) -> Result<Vec<GeneratedFile>, AppError> {
        let fields = match context.matched_table_schemas.first() {
            Some(table) => fields_from_table(table),
            None => context
                .properties
                .iter()
                .map(|name| Field {
                    name: camel_case(name),
                    java_type: "String",
                })
                .collect(),
        };
        let dto_type = format!("{}DTO", component.name);
        Ok(vec![self.dto(&context.target_package, &dto_type, &fields)?])
    }

    fn dto(&self, package: &str, class_name: &str, fields: &[Field]) -> Result<GeneratedFile, AppError> {
        let field_lines = fields
            .iter()
            .map(|field| format!("    private {} {};", field.java_type, field.name))
            .collect::<Vec<_>>()
            .join("\n");
        let imports = imports_for(fields);

        let contents = render(
            DTO_TEMPLATE,
            &[
                ("package", package),
                ("imports", imports.as_str()),
                ("class_name", class_name),
                ("fields", field_lines.as_str()),
            ],
        )?;
        Ok(self.file(package, "dto", class_name, contents))
    }
}

impl CodeEmitter for JavaEmitter {
    fn target(&self) -> &'static str {
        "java"
    }

    fn generate(
        &self,
        component: &Component,
        context: &MigrationContext,
    ) -> Result<Vec<GeneratedFile>, AppError> {
        if context.target_package.trim().is_empty() {
            return Err(AppError::Generation("target package is empty".into()));
        }

        let mut files = match component.kind {
            ComponentKind::Controller => self.controller(component, context)?,
            ComponentKind::Service => self.service(component, context)?,
            ComponentKind::Repository => self.repository(component, context)?,
            ComponentKind::Model => self.model(component, context)?,
            ComponentKind::Other => {
                return Err(AppError::Generation(format!(
                    "no Java template for '{}' (kind other)",
                    component.name
                )));
            }
        };

        if let Some(header) = guideline_comment(&context.guidelines.backend) {
            for file in &mut files {
                file.contents.insert_str(0, &header);
            }
        }
        Ok(files)
    }
}

/// `OrderController` -> `Order`; a name without the suffix is used as is.
fn entity_name(class_name: &str, suffix: &str) -> Result<String, AppError> {
    let entity = class_name.strip_suffix(suffix).unwrap_or(class_name);
    if entity.is_empty() {
        return Err(AppError::Generation(format!(
            "cannot derive an entity name from '{}'",
            class_name
        )));
    }
    Ok(entity.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnDef, DependencyDescriptor, Metadata};
    use crate::parsers::{GuidelineSection, Guidelines};
    use std::path::Path;

    fn component(name: &str, kind: ComponentKind) -> Component {
        Component {
            id: format!("id-{}", name),
            name: name.to_string(),
            kind,
            namespace: "Shop.Web".into(),
            file_path: format!("src/{}.cs", name),
            code_content: format!("public class {} {{}}", name),
            embedding: vec![],
            metadata: Metadata::new(),
        }
    }

    fn dependency(name: &str, kind: ComponentKind) -> DependencyDescriptor {
        DependencyDescriptor {
            id: format!("id-{}", name),
            name: name.into(),
            kind,
            namespace: "Shop".into(),
            file_path: format!("src/{}.cs", name),
            dependency_type: "USES".into(),
            strength: 1.0,
        }
    }

    fn orders_table() -> TableSchema {
        TableSchema::new(
            "dbo",
            "Order",
            vec![
                ColumnDef {
                    name: "Id".into(),
                    data_type: "int".into(),
                    nullable: false,
                    max_length: None,
                },
                ColumnDef {
                    name: "CustomerId".into(),
                    data_type: "bigint".into(),
                    nullable: false,
                    max_length: None,
                },
                ColumnDef {
                    name: "order_total".into(),
                    data_type: "decimal(18,2)".into(),
                    nullable: true,
                    max_length: None,
                },
            ],
        )
    }

    fn context() -> MigrationContext {
        MigrationContext {
            target_package: "com.acme.shop".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_java_type_map() {
        assert_eq!(java_type("int"), "Integer");
        assert_eq!(java_type("NVARCHAR(50)"), "String");
        assert_eq!(java_type("decimal(18,2)"), "BigDecimal");
        assert_eq!(java_type("datetime2"), "LocalDateTime");
        assert_eq!(java_type("uniqueidentifier"), "UUID");
        assert_eq!(java_type("geography"), "String");
    }

    #[test]
    fn test_controller_emits_controller_and_dto() {
        let mut ctx = context();
        ctx.dependencies = vec![
            dependency("OrderService", ComponentKind::Service),
            dependency("AuditService", ComponentKind::Service),
            dependency("OrderRepository", ComponentKind::Repository),
        ];
        ctx.matched_table_schemas = vec![orders_table()];
        ctx.methods = vec!["Index".into(), "Details".into()];

        let files = JavaEmitter::new()
            .generate(&component("OrderController", ComponentKind::Controller), &ctx)
            .unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(
            files[0].path,
            Path::new("src/main/java/com/acme/shop/controller/OrderController.java")
        );
        let controller = &files[0].contents;
        assert!(controller.starts_with("package com.acme.shop.controller;"));
        assert!(controller.contains("@RequestMapping(\"/order\")"));
        assert!(controller.contains("private final com.acme.shop.service.OrderService orderService;"));
        assert!(controller.contains("private final com.acme.shop.service.AuditService auditService;"));
        assert!(!controller.contains("OrderRepository"));
        assert!(controller.contains("// Legacy actions: Index, Details"));
        assert!(controller.contains("@GetMapping(\"/{id}\")"));

        assert_eq!(
            files[1].path,
            Path::new("src/main/java/com/acme/shop/dto/OrderDTO.java")
        );
        let dto = &files[1].contents;
        assert!(dto.contains("import java.math.BigDecimal;"));
        assert!(dto.contains("    private Integer id;"));
        assert!(dto.contains("    private Long customerId;"));
        assert!(dto.contains("    private BigDecimal orderTotal;"));
    }

    #[test]
    fn test_controller_leaves_dto_to_migrated_model() {
        let mut ctx = context();
        ctx.matched_table_schemas = vec![orders_table()];
        ctx.migrated_models = vec!["Order".into()];

        let files = JavaEmitter::new()
            .generate(&component("OrderController", ComponentKind::Controller), &ctx)
            .unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].path.ends_with("controller/OrderController.java"));
        assert!(files[0].contents.contains("import com.acme.shop.dto.OrderDTO;"));
    }

    #[test]
    fn test_backend_guidelines_head_every_file() {
        let mut ctx = context();
        ctx.guidelines.backend = Guidelines {
            sections: vec![GuidelineSection {
                title: "Naming Conventions".into(),
                body: "Suffix DTOs with DTO.".into(),
            }],
        };
        ctx.guidelines.frontend = Guidelines {
            sections: vec![GuidelineSection {
                title: "Best Practices".into(),
                body: "Prefer signals.".into(),
            }],
        };

        let files = JavaEmitter::new()
            .generate(&component("OrderController", ComponentKind::Controller), &ctx)
            .unwrap();

        assert_eq!(files.len(), 2);
        for file in &files {
            assert!(file.contents.starts_with("/*\n * Project guidelines\n"));
            assert!(file.contents.contains(" * ## Naming Conventions\n * Suffix DTOs with DTO.\n */\npackage com.acme.shop."));
            assert!(!file.contents.contains("Prefer signals."));
        }
    }

    #[test]
    fn test_controller_without_service_dependency_still_declares_primary_service() {
        let files = JavaEmitter::new()
            .generate(
                &component("CustomerDetailsController", ComponentKind::Controller),
                &context(),
            )
            .unwrap();

        let controller = &files[0].contents;
        assert!(controller.contains("@RequestMapping(\"/customer-details\")"));
        assert!(controller.contains(
            "private final com.acme.shop.service.CustomerDetailsService customerDetailsService;"
        ));
    }

    #[test]
    fn test_service_uses_repository_dependency() {
        let mut ctx = context();
        ctx.dependencies = vec![dependency("LegacyOrderRepository", ComponentKind::Repository)];

        let files = JavaEmitter::new()
            .generate(&component("OrderService", ComponentKind::Service), &ctx)
            .unwrap();

        assert_eq!(files.len(), 1);
        let service = &files[0].contents;
        assert!(service.contains("private final LegacyOrderRepository legacyOrderRepository;"));
        assert!(service.contains("public Optional<Order> findById(Long id)"));
    }

    #[test]
    fn test_repository_finders_follow_table_columns() {
        let mut ctx = context();
        ctx.matched_table_schemas = vec![orders_table()];

        let files = JavaEmitter::new()
            .generate(&component("OrderRepository", ComponentKind::Repository), &ctx)
            .unwrap();

        let repository = &files[0].contents;
        assert!(repository.contains("extends JpaRepository<Order, Long>"));
        assert!(repository.contains("List<Order> findByCustomerId(Long customerId);"));
        assert!(repository.contains("List<Order> findByOrderTotal(BigDecimal orderTotal);"));
        assert!(!repository.contains("findById("));
    }

    #[test]
    fn test_model_falls_back_to_properties() {
        let mut ctx = context();
        ctx.properties = vec!["Name".into(), "Email".into()];

        let files = JavaEmitter::new()
            .generate(&component("Customer", ComponentKind::Model), &ctx)
            .unwrap();

        assert_eq!(files[0].path, Path::new("src/main/java/com/acme/shop/dto/CustomerDTO.java"));
        assert!(files[0].contents.contains("    private String name;"));
        assert!(files[0].contents.contains("    private String email;"));
    }

    #[test]
    fn test_other_kind_is_a_generation_error() {
        let err = JavaEmitter::new()
            .generate(&component("Startup", ComponentKind::Other), &context())
            .unwrap_err();
        assert_eq!(err.code(), "GENERATION_ERROR");
    }

    #[test]
    fn test_empty_package_is_rejected() {
        let ctx = MigrationContext::default();
        let err = JavaEmitter::new()
            .generate(&component("OrderController", ComponentKind::Controller), &ctx)
            .unwrap_err();
        assert!(err.to_string().contains("target package is empty"));
    }

    #[test]
    fn test_bare_suffix_name_is_rejected() {
        let err = JavaEmitter::new()
            .generate(&component("Controller", ComponentKind::Controller), &context())
            .unwrap_err();
        assert!(err.to_string().contains("cannot derive an entity name"));
    }
}
