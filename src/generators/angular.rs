//! Angular emitter: one standalone list component per legacy controller.

use std::path::PathBuf;

use super::naming::{camel_case, kebab_case, lower_first, title_case};
use super::template::render;
use super::{guideline_comment, CodeEmitter, GeneratedFile};
use crate::error::AppError;
use crate::models::{Component, ComponentKind};
use crate::services::MigrationContext;

const COMPONENT_TEMPLATE: &str = r#"import { Component, OnInit } from '@angular/core';
import { CommonModule } from '@angular/common';
import { RouterModule } from '@angular/router';
import { {{service_name}} } from '../../services/{{service_file}}';
import { {{model_name}} } from '../../models/{{model_file}}';

@Component({
  selector: 'app-{{selector}}',
  standalone: true,
  imports: [CommonModule, RouterModule],
  templateUrl: './{{selector}}.component.html',
  styleUrls: ['./{{selector}}.component.scss']
})
export class {{class_name}} implements OnInit {
  items: {{model_name}}[] = [];
  loading = false;

  constructor(private {{service_var}}: {{service_name}}) {}

  ngOnInit(): void {
    this.loadItems();
  }

  loadItems(): void {
    this.loading = true;
    this.{{service_var}}.getAll().subscribe({
      next: (data) => { this.items = data; this.loading = false; },
      error: (err) => { console.error('Error loading items', err); this.loading = false; }
    });
  }

  delete(id: number): void {
    if (confirm('Are you sure?')) {
      this.{{service_var}}.delete(id).subscribe({
        next: () => this.loadItems(),
        error: (err) => console.error('Error deleting', err)
      });
    }
  }
}
"#;

const HTML_TEMPLATE: &str = r#"<div class="{{selector}}-container">
  <h2>{{title}}</h2>

  <button routerLink="/{{selector}}/new" class="btn btn-primary">
    Add New
  </button>

  <div *ngIf="loading" class="loading">Loading...</div>

  <table *ngIf="!loading && items.length > 0" class="table">
    <thead>
      <tr>
        <th>ID</th>
{{headers}}
        <th>Actions</th>
      </tr>
    </thead>
    <tbody>
      <tr *ngFor="let item of items">
        <td>{{ item.id }}</td>
{{cells}}
        <td>
          <button [routerLink]="['/{{selector}}', item.id]" class="btn btn-sm">Edit</button>
          <button (click)="delete(item.id)" class="btn btn-sm btn-danger">Delete</button>
        </td>
      </tr>
    </tbody>
  </table>

  <div *ngIf="!loading && items.length === 0" class="no-data">
    No items found.
  </div>
</div>
"#;

/// Emits an Angular list component for each controller.
///
/// Other kinds produce nothing. Paths are relative to the frontend project
/// root.
#[derive(Debug, Default, Clone, Copy)]
pub struct AngularEmitter;

impl AngularEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl CodeEmitter for AngularEmitter {
    fn target(&self) -> &'static str {
        "angular"
    }

    fn generate(
        &self,
        component: &Component,
        context: &MigrationContext,
    ) -> Result<Vec<GeneratedFile>, AppError> {
        if component.kind != ComponentKind::Controller {
            return Ok(Vec::new());
        }

        let entity = component
            .name
            .strip_suffix("Controller")
            .unwrap_or(&component.name);
        if entity.is_empty() {
            return Err(AppError::Generation(format!(
                "cannot derive a component name from '{}'",
                component.name
            )));
        }

        let selector = kebab_case(entity);
        let class_name = format!("{}Component", entity);
        let service_name = format!("{}Service", entity);
        let service_var = lower_first(&service_name);
        let service_file = format!("{}.service", selector);

        // Table columns other than the key become list columns.
        let fields: Vec<String> = context
            .matched_table_schemas
            .first()
            .map(|table| {
                table
                    .columns
                    .iter()
                    .map(|column| camel_case(&column.name))
                    .filter(|name| name != "id")
                    .collect()
            })
            .unwrap_or_default();
        let headers = fields
            .iter()
            .map(|name| format!("        <th>{}</th>", title_case(name)))
            .collect::<Vec<_>>()
            .join("\n");
        let cells = fields
            .iter()
            .map(|name| format!("        <td>{{{{ item.{} }}}}</td>", name))
            .collect::<Vec<_>>()
            .join("\n");

        let mut script = render(
            COMPONENT_TEMPLATE,
            &[
                ("service_name", service_name.as_str()),
                ("service_file", service_file.as_str()),
                ("model_name", entity),
                ("model_file", selector.as_str()),
                ("selector", selector.as_str()),
                ("class_name", class_name.as_str()),
                ("service_var", service_var.as_str()),
            ],
        )?;
        let markup = render(
            HTML_TEMPLATE,
            &[
                ("selector", selector.as_str()),
                ("title", entity),
                ("headers", headers.as_str()),
                ("cells", cells.as_str()),
            ],
        )?;

        if let Some(header) = guideline_comment(&context.guidelines.frontend) {
            script.insert_str(0, &header);
        }

        let dir = PathBuf::from("src/app/components").join(&selector);
        Ok(vec![
            GeneratedFile {
                path: dir.join(format!("{}.component.ts", selector)),
                contents: script,
            },
            GeneratedFile {
                path: dir.join(format!("{}.component.html", selector)),
                contents: markup,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnDef, Metadata, TableSchema};
    use crate::parsers::{GuidelineSection, Guidelines};
    use std::path::Path;

    fn component(name: &str, kind: ComponentKind) -> Component {
        Component {
            id: "id".into(),
            name: name.into(),
            kind,
            namespace: "Shop.Web".into(),
            file_path: format!("Controllers/{}.cs", name),
            code_content: String::new(),
            embedding: vec![],
            metadata: Metadata::new(),
        }
    }

    fn column(name: &str) -> ColumnDef {
        ColumnDef {
            name: name.into(),
            data_type: "nvarchar".into(),
            nullable: true,
            max_length: Some(100),
        }
    }

    #[test]
    fn test_controller_emits_component_and_template() {
        let ctx = MigrationContext {
            target_package: "com.acme".into(),
            matched_table_schemas: vec![TableSchema::new(
                "dbo",
                "OrderLine",
                vec![column("Id"), column("ProductName"), column("Quantity")],
            )],
            ..Default::default()
        };

        let files = AngularEmitter::new()
            .generate(&component("OrderLineController", ComponentKind::Controller), &ctx)
            .unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(
            files[0].path,
            Path::new("src/app/components/order-line/order-line.component.ts")
        );
        assert!(files[0].contents.contains("selector: 'app-order-line'"));
        assert!(files[0].contents.contains("export class OrderLineComponent implements OnInit"));
        assert!(files[0]
            .contents
            .contains("constructor(private orderLineService: OrderLineService) {}"));

        let html = &files[1].contents;
        assert!(html.contains("<h2>OrderLine</h2>"));
        assert!(html.contains("<td>{{ item.id }}</td>"));
        assert!(html.contains("        <th>Product Name</th>"));
        assert!(html.contains("        <td>{{ item.productName }}</td>"));
        assert!(!html.contains("<th>Id</th>"));
    }

    #[test]
    fn test_frontend_guidelines_head_the_component_script() {
        let mut ctx = MigrationContext {
            target_package: "com.acme".into(),
            ..Default::default()
        };
        ctx.guidelines.frontend = Guidelines {
            sections: vec![GuidelineSection {
                title: "Coding Standards".into(),
                body: "Standalone components only.".into(),
            }],
        };

        let files = AngularEmitter::new()
            .generate(&component("OrderController", ComponentKind::Controller), &ctx)
            .unwrap();

        assert!(files[0].contents.starts_with("/*\n * Project guidelines\n"));
        assert!(files[0].contents.contains(" * Standalone components only.\n"));
        assert!(!files[1].contents.contains("Standalone components only."));
    }

    #[test]
    fn test_non_controllers_emit_nothing() {
        let files = AngularEmitter::new()
            .generate(
                &component("OrderService", ComponentKind::Service),
                &MigrationContext::default(),
            )
            .unwrap();
        assert!(files.is_empty());
    }
}
