//! JSON model description and its loading into a converter.
//!
//! Variables are referenced by name. `definitions` introduce named result
//! variables for functional constraints, in order, so a definition may use
//! any variable or earlier definition.

use flatcvt_core::{
    CondCon, ComplementarityCon, Constraint, ConvertError, Converter, FuncCon, IndicatorCon,
    LinCon, LinRangeCon, ModelApi, Objective, PlCon, QuadCon, QuadRangeCon, Sense, SosCon,
    Variable,
};
use flatcvt_expr::expr::linear_terms;
use flatcvt_expr::{AffineExpr, QuadExpr, VarId};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct ModelFile {
    #[serde(default)]
    pub variables: Vec<VariableDef>,
    #[serde(default)]
    pub definitions: Vec<NamedDef>,
    #[serde(default)]
    pub constraints: Vec<ConstraintDef>,
    #[serde(default)]
    pub objectives: Vec<ObjectiveDef>,
}

/// Missing bounds are infinite.
#[derive(Debug, Deserialize)]
pub struct VariableDef {
    pub name: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    #[serde(default)]
    pub integer: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExprDef {
    #[serde(default)]
    pub terms: Vec<(String, f64)>,
    #[serde(default)]
    pub quad: Vec<(String, String, f64)>,
    #[serde(default)]
    pub constant: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowSense {
    Le,
    Eq,
    Ge,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

/// A function of named arguments. Which fields are read depends on
/// `function`.
#[derive(Debug, Deserialize)]
pub struct FunctionDef {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub params: Vec<f64>,
    #[serde(default)]
    pub expr: Option<ExprDef>,
    #[serde(default)]
    pub rhs: f64,
    #[serde(default)]
    pub breakpoints: Vec<f64>,
    #[serde(default)]
    pub slopes: Vec<f64>,
    #[serde(default)]
    pub x0: f64,
    #[serde(default)]
    pub y0: f64,
}

#[derive(Debug, Deserialize)]
pub struct NamedDef {
    pub name: String,
    #[serde(flatten)]
    pub body: FunctionDef,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintDef {
    Algebraic {
        expr: ExprDef,
        sense: RowSense,
        rhs: f64,
    },
    Range {
        expr: ExprDef,
        lower: Option<f64>,
        upper: Option<f64>,
    },
    Indicator {
        var: String,
        value: i64,
        expr: ExprDef,
        sense: RowSense,
        rhs: f64,
    },
    Sos1 {
        vars: Vec<String>,
        weights: Vec<f64>,
    },
    Sos2 {
        vars: Vec<String>,
        weights: Vec<f64>,
    },
    Complementarity {
        expr: ExprDef,
        var: String,
    },
    /// Logical function that must hold.
    Logical(FunctionDef),
}

#[derive(Debug, Deserialize)]
pub struct ObjectiveDef {
    pub sense: ObjectiveSense,
    pub expr: ExprDef,
}

/// Errors raised while reading a model description.
#[derive(Debug)]
pub enum ModelError {
    Parse(serde_json::Error),
    UnknownVariable { name: String },
    DuplicateName { name: String },
    UnknownFunction { function: String },
    MissingField { function: String, field: &'static str },
    Convert(ConvertError),
}

impl ModelError {
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::Parse(_) => "MODEL_PARSE_FAILED",
            ModelError::UnknownVariable { .. } => "MODEL_UNKNOWN_VARIABLE",
            ModelError::DuplicateName { .. } => "MODEL_DUPLICATE_NAME",
            ModelError::UnknownFunction { .. } => "MODEL_UNKNOWN_FUNCTION",
            ModelError::MissingField { .. } => "MODEL_MISSING_FIELD",
            ModelError::Convert(err) => err.code(),
        }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, ModelError::Convert(err) if err.is_infeasible())
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Parse(err) => write!(f, "[{}] {}", self.code(), err),
            ModelError::UnknownVariable { name } => {
                write!(f, "[{}] Unknown variable '{}'", self.code(), name)
            }
            ModelError::DuplicateName { name } => {
                write!(f, "[{}] Name '{}' is defined twice", self.code(), name)
            }
            ModelError::UnknownFunction { function } => {
                write!(f, "[{}] Unknown function '{}'", self.code(), function)
            }
            ModelError::MissingField { function, field } => write!(
                f,
                "[{}] Function '{}' needs field '{}'",
                self.code(),
                function,
                field
            ),
            ModelError::Convert(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<ConvertError> for ModelError {
    fn from(err: ConvertError) -> Self {
        ModelError::Convert(err)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Parse(err)
    }
}

pub fn parse_model(text: &str) -> Result<ModelFile, ModelError> {
    Ok(serde_json::from_str(text)?)
}

/// Name -> variable table built while loading.
struct Names {
    vars: HashMap<String, VarId>,
}

impl Names {
    fn insert(&mut self, name: &str, var: VarId) -> Result<(), ModelError> {
        if self.vars.insert(name.to_string(), var).is_some() {
            return Err(ModelError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn get(&self, name: &str) -> Result<VarId, ModelError> {
        self.vars
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::UnknownVariable {
                name: name.to_string(),
            })
    }

    fn all(&self, names: &[String]) -> Result<Vec<VarId>, ModelError> {
        names.iter().map(|n| self.get(n)).collect()
    }

    fn affine(&self, item: &ExprDef) -> Result<AffineExpr, ModelError> {
        let vars = item
            .terms
            .iter()
            .map(|(name, _)| self.get(name))
            .collect::<Result<Vec<_>, _>>()?;
        let coefs: Vec<f64> = item.terms.iter().map(|(_, c)| *c).collect();
        let terms = linear_terms(&vars, &coefs).map_err(ConvertError::from)?;
        Ok(AffineExpr::new(terms, item.constant))
    }

    fn quadratic(&self, item: &ExprDef) -> Result<QuadExpr, ModelError> {
        let mut expr = QuadExpr::from_affine(self.affine(item)?);
        for (a, b, coef) in &item.quad {
            expr.add_quad_term(self.get(a)?, self.get(b)?, *coef);
        }
        Ok(expr)
    }
}

fn expr_of(item: &FunctionDef) -> Result<&ExprDef, ModelError> {
    item.expr.as_ref().ok_or_else(|| ModelError::MissingField {
        function: item.function.clone(),
        field: "expr",
    })
}

fn comparison(names: &Names, item: &FunctionDef) -> Result<Constraint, ModelError> {
    let expr = expr_of(item)?;
    if expr.quad.is_empty() {
        let con = CondCon::new(LinCon::new(names.affine(expr)?, item.rhs));
        return Ok(match item.function.as_str() {
            "cond_eq" => Constraint::CondLinEq(con),
            "cond_le" => Constraint::CondLinLe(con),
            "cond_lt" => Constraint::CondLinLt(con),
            "cond_ge" => Constraint::CondLinGe(con),
            _ => Constraint::CondLinGt(con),
        });
    }
    let con = CondCon::new(QuadCon::new(names.quadratic(expr)?, item.rhs));
    Ok(match item.function.as_str() {
        "cond_eq" => Constraint::CondQuadEq(con),
        "cond_le" => Constraint::CondQuadLe(con),
        "cond_lt" => Constraint::CondQuadLt(con),
        "cond_ge" => Constraint::CondQuadGe(con),
        _ => Constraint::CondQuadGt(con),
    })
}

fn function(names: &Names, item: &FunctionDef) -> Result<Constraint, ModelError> {
    let func = || -> Result<FuncCon, ModelError> {
        Ok(FuncCon::with_params(names.all(&item.args)?, item.params.clone()))
    };
    let con = match item.function.as_str() {
        "max" => Constraint::Max(func()?),
        "min" => Constraint::Min(func()?),
        "abs" => Constraint::Abs(func()?),
        "and" => Constraint::And(func()?),
        "or" => Constraint::Or(func()?),
        "not" => Constraint::Not(func()?),
        "div" => Constraint::Div(func()?),
        "if_then" => Constraint::IfThen(func()?),
        "alldiff" => Constraint::AllDiff(func()?),
        "count" => Constraint::Count(func()?),
        "numberof_const" => Constraint::NumberofConst(func()?),
        "numberof_var" => Constraint::NumberofVar(func()?),
        "exp" => Constraint::Exp(func()?),
        "expa" => Constraint::ExpA(func()?),
        "log" => Constraint::Log(func()?),
        "loga" => Constraint::LogA(func()?),
        "pow" => Constraint::Pow(func()?),
        "sin" => Constraint::Sin(func()?),
        "cos" => Constraint::Cos(func()?),
        "tan" => Constraint::Tan(func()?),
        "cond_eq" | "cond_le" | "cond_lt" | "cond_ge" | "cond_gt" => comparison(names, item)?,
        "pl" => {
            let arg = item.args.first().ok_or_else(|| ModelError::MissingField {
                function: item.function.clone(),
                field: "args",
            })?;
            let pl = PlCon::new(
                names.get(arg)?,
                item.breakpoints.clone(),
                item.slopes.clone(),
                item.x0,
                item.y0,
            )
            .map_err(ConvertError::from)?;
            Constraint::Pl(pl)
        }
        other => {
            return Err(ModelError::UnknownFunction {
                function: other.to_string(),
            });
        }
    };
    Ok(con)
}

fn algebraic(
    names: &Names,
    expr: &ExprDef,
    sense: RowSense,
    rhs: f64,
) -> Result<Constraint, ModelError> {
    if expr.quad.is_empty() {
        let con = LinCon::new(names.affine(expr)?, rhs);
        return Ok(match sense {
            RowSense::Le => Constraint::LinLe(con),
            RowSense::Eq => Constraint::LinEq(con),
            RowSense::Ge => Constraint::LinGe(con),
        });
    }
    let con = QuadCon::new(names.quadratic(expr)?, rhs);
    Ok(match sense {
        RowSense::Le => Constraint::QuadLe(con),
        RowSense::Eq => Constraint::QuadEq(con),
        RowSense::Ge => Constraint::QuadGe(con),
    })
}

fn constraint(names: &Names, item: &ConstraintDef) -> Result<Constraint, ModelError> {
    let con = match item {
        ConstraintDef::Algebraic { expr, sense, rhs } => algebraic(names, expr, *sense, *rhs)?,
        ConstraintDef::Range { expr, lower, upper } => {
            let lower = lower.unwrap_or(f64::NEG_INFINITY);
            let upper = upper.unwrap_or(f64::INFINITY);
            if expr.quad.is_empty() {
                Constraint::LinRange(LinRangeCon::new(names.affine(expr)?, lower, upper))
            } else {
                Constraint::QuadRange(QuadRangeCon::new(names.quadratic(expr)?, lower, upper))
            }
        }
        ConstraintDef::Indicator {
            var,
            value,
            expr,
            sense,
            rhs,
        } => {
            let bvar = names.get(var)?;
            let indicator = |inner: Constraint| -> Result<Constraint, ConvertError> {
                Ok(match inner {
                    Constraint::LinLe(c) => Constraint::IndLinLe(IndicatorCon::new(bvar, *value, c)?),
                    Constraint::LinEq(c) => Constraint::IndLinEq(IndicatorCon::new(bvar, *value, c)?),
                    Constraint::LinGe(c) => Constraint::IndLinGe(IndicatorCon::new(bvar, *value, c)?),
                    Constraint::QuadLe(c) => {
                        Constraint::IndQuadLe(IndicatorCon::new(bvar, *value, c)?)
                    }
                    Constraint::QuadEq(c) => {
                        Constraint::IndQuadEq(IndicatorCon::new(bvar, *value, c)?)
                    }
                    Constraint::QuadGe(c) => {
                        Constraint::IndQuadGe(IndicatorCon::new(bvar, *value, c)?)
                    }
                    other => other,
                })
            };
            indicator(algebraic(names, expr, *sense, *rhs)?)?
        }
        ConstraintDef::Sos1 { vars, weights } => Constraint::Sos1(
            SosCon::new(names.all(vars)?, weights.clone()).map_err(ConvertError::from)?,
        ),
        ConstraintDef::Sos2 { vars, weights } => Constraint::Sos2(
            SosCon::new(names.all(vars)?, weights.clone()).map_err(ConvertError::from)?,
        ),
        ConstraintDef::Complementarity { expr, var } => {
            let var = names.get(var)?;
            if expr.quad.is_empty() {
                Constraint::ComplLin(ComplementarityCon::new(names.affine(expr)?, var))
            } else {
                Constraint::ComplQuad(ComplementarityCon::new(names.quadratic(expr)?, var))
            }
        }
        ConstraintDef::Logical(body) => function(names, body)?,
    };
    Ok(con)
}

/// Feed `model` into a converter that has started model input.
pub fn load_model<B: ModelApi>(
    cvt: &mut Converter<B>,
    model: &ModelFile,
) -> Result<(), ModelError> {
    let mut names = Names {
        vars: HashMap::new(),
    };
    for item in &model.variables {
        let lower = item.lower.unwrap_or(f64::NEG_INFINITY);
        let upper = item.upper.unwrap_or(f64::INFINITY);
        let var = if item.integer {
            Variable::integer(lower, upper)
        } else {
            Variable::continuous(lower, upper)
        };
        let id = cvt.input_var(var)?;
        names.insert(&item.name, id)?;
    }
    for def in &model.definitions {
        let id = if def.body.function == "expr" {
            let expr = names.quadratic(expr_of(&def.body)?)?;
            cvt.convert_quad_to_var(expr)?
        } else {
            let con = function(&names, &def.body)?;
            cvt.assign_result_var(con)?
        };
        names.insert(&def.name, id)?;
    }
    for item in &model.constraints {
        let con = constraint(&names, item)?;
        if matches!(item, ConstraintDef::Logical(_)) {
            cvt.input_logical(con)?;
        } else {
            cvt.input_constraint(con)?;
        }
    }
    for item in &model.objectives {
        let sense = match item.sense {
            ObjectiveSense::Minimize => Sense::Minimize,
            ObjectiveSense::Maximize => Sense::Maximize,
        };
        let objective = if item.expr.quad.is_empty() {
            Objective::linear(sense, names.affine(&item.expr)?)
        } else {
            Objective::quadratic(sense, names.quadratic(&item.expr)?)
        };
        cvt.input_objective(objective)?;
    }
    tracing::debug!(
        component = "cli",
        operation = "load_model",
        status = "success",
        variables = model.variables.len(),
        definitions = model.definitions.len(),
        constraints = model.constraints.len(),
        objectives = model.objectives.len(),
        "Loaded model description"
    );
    Ok(())
}
