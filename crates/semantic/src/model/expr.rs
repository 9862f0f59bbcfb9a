// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Name resolution inside value expressions

use querymodel_ir::DataType;
use tracing::debug;

use crate::context::{DataContext, ResultColumn};
use crate::error::SemanticError;
use crate::recognition::RecognitionContext;
use crate::symbol::{EntryId, SymbolClass, SymbolDefinition};

use super::{LiteralKind, ValueExpr};

/// What resolving an expression found out about it
#[derive(Debug, Clone, Default)]
pub(crate) struct ExprInfo {
    /// Set when the expression is a plain column reference that resolved
    pub column: Option<ResultColumn>,
    pub data_type: Option<DataType>,
}

impl LiteralKind {
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            LiteralKind::Integer => Some(DataType::Integer),
            LiteralKind::Decimal => Some(DataType::Decimal),
            LiteralKind::String => Some(DataType::Text),
            LiteralKind::Boolean => Some(DataType::Boolean),
            LiteralKind::Null => None,
        }
    }
}

impl ValueExpr {
    /// Resolve every column reference in the expression against `context`
    pub(crate) fn resolve(&self, context: &DataContext, rc: &mut RecognitionContext<'_>) -> ExprInfo {
        match self {
            ValueExpr::Column { qualifier, name, .. } => {
                let column = resolve_column(*qualifier, *name, context, rc);
                let data_type = column.as_ref().and_then(|c| c.data_type.clone());
                ExprInfo { column, data_type }
            }
            ValueExpr::Literal { kind, .. } => ExprInfo {
                column: None,
                data_type: kind.data_type(),
            },
            ValueExpr::Subquery { query, .. } => {
                let inner = query.propagate_context(&context.nested_scope(), rc);
                let data_type = match inner.columns() {
                    [single] => single.data_type.clone(),
                    _ => None,
                };
                ExprInfo { column: None, data_type }
            }
            ValueExpr::Call { name, arguments, .. } => {
                let symbol = rc.symbols().entry(*name).symbol();
                let symbols = rc.symbols_mut();
                symbols.classify(symbol, SymbolClass::ProcedureName);
                symbols.set_definition(symbol, SymbolDefinition::Entry(*name));
                for argument in arguments {
                    argument.resolve(context, rc);
                }
                ExprInfo::default()
            }
            ValueExpr::Composite { operands, .. } => {
                for operand in operands {
                    operand.resolve(context, rc);
                }
                ExprInfo::default()
            }
        }
    }
}

/// Columns visible through a qualifier such as `u` in `u.id` or `u.*`
///
/// Reports an unresolved alias and returns `None` if the qualifier names no
/// visible alias. The qualifier entry is bound to the alias symbol.
pub(crate) fn resolve_qualifier(
    qualifier: EntryId,
    context: &DataContext,
    rc: &mut RecognitionContext<'_>,
) -> Option<Vec<ResultColumn>> {
    let entry = rc.symbols().entry(qualifier).clone();
    let Some(binding) = context
        .find_alias(entry.name(), entry.is_quoted(), rc.config())
        .cloned()
    else {
        rc.report_diagnostic(entry.range(), SemanticError::UnresolvedAlias(entry.name().to_string()));
        rc.symbols_mut().classify(entry.symbol(), SymbolClass::Error);
        return None;
    };

    rc.symbols_mut().bind_entry(qualifier, binding.symbol);
    if rc.symbols().symbol(binding.symbol).class().is_error() {
        // the alias itself is broken and already reported
        return None;
    }

    let columns = rc
        .output_context(binding.source)
        .map(DataContext::get_columns_list)
        .unwrap_or_default();
    Some(columns)
}

/// Resolve `[qualifier.]name` to exactly one visible column
fn resolve_column(
    qualifier: Option<EntryId>,
    name: EntryId,
    context: &DataContext,
    rc: &mut RecognitionContext<'_>,
) -> Option<ResultColumn> {
    let config = rc.config();
    let entry = rc.symbols().entry(name).clone();

    let candidates: Vec<ResultColumn> = match qualifier {
        Some(qualifier) => match resolve_qualifier(qualifier, context, rc) {
            Some(columns) => columns
                .into_iter()
                .filter(|c| config.names_match(&c.name, false, entry.name(), entry.is_quoted()))
                .collect(),
            None => {
                rc.symbols_mut().classify(entry.symbol(), SymbolClass::Error);
                return None;
            }
        },
        None => context
            .find_columns(entry.name(), entry.is_quoted(), config)
            .into_iter()
            .cloned()
            .collect(),
    };

    match candidates.as_slice() {
        [] => {
            let display = match qualifier {
                Some(q) => format!("{}.{}", rc.symbols().entry(q).name(), entry.name()),
                None => entry.name().to_string(),
            };
            rc.report_diagnostic(entry.range(), SemanticError::UnknownColumn(display));
            rc.symbols_mut().classify(entry.symbol(), SymbolClass::Error);
            None
        }
        [column] => {
            if !rc.symbols_mut().bind_entry(name, column.symbol) {
                debug!(column = entry.name(), "Reference already resolved elsewhere");
            }
            Some(column.clone())
        }
        many => {
            let sources = many.iter().map(ResultColumn::source_label).collect();
            rc.report_diagnostic(
                entry.range(),
                SemanticError::AmbiguousColumn(entry.name().to_string(), sources),
            );
            rc.symbols_mut().classify(entry.symbol(), SymbolClass::Ambiguous);
            None
        }
    }
}
