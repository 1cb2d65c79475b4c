// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scene description parser using pest
//!
//! A scene is a list of `let` bindings followed by one expression whose value
//! must be a shape. Expressions are evaluated straight into `Sdf` values while
//! walking the parse tree, so there is no separate AST.

use crate::field::{ops, Sdf};
use crate::utils::math;
use ahash::AHashMap;
use anyhow::{anyhow, bail, Context, Result};
use nalgebra::{Point3, Vector3};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "io/scene.pest"]
struct SceneParser;

/// Value of a scene expression
#[derive(Debug, Clone)]
enum Value {
    Number(f64),
    Vector(Vector3<f64>),
    Shape(Sdf),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Vector(_) => "vector",
            Value::Shape(_) => "shape",
        }
    }
}

/// Parse a scene description into a field
pub fn parse_scene(source: &str) -> Result<Sdf> {
    let program = SceneParser::parse(Rule::program, source)
        .context("Failed to parse scene")?
        .next()
        .ok_or_else(|| anyhow!("Empty scene"))?;

    let mut env: AHashMap<String, Value> = AHashMap::new();
    let mut scene = None;

    for pair in program.into_inner() {
        match pair.as_rule() {
            Rule::binding => {
                let mut inner = pair.into_inner();
                let name = next(&mut inner)?.as_str().to_string();
                let value = eval(next(&mut inner)?, &env)
                    .with_context(|| format!("In binding `{}`", name))?;
                env.insert(name, value);
            }
            Rule::expr => scene = Some(eval(pair, &env)?),
            Rule::EOI => {}
            _ => {}
        }
    }

    match scene {
        Some(Value::Shape(sdf)) => Ok(sdf),
        Some(other) => bail!("Scene must end in a shape, found a {}", other.kind()),
        None => bail!("Scene has no expression"),
    }
}

fn next<'i>(pairs: &mut pest::iterators::Pairs<'i, Rule>) -> Result<Pair<'i, Rule>> {
    pairs.next().ok_or_else(|| anyhow!("Malformed parse tree"))
}

fn eval(pair: Pair<Rule>, env: &AHashMap<String, Value>) -> Result<Value> {
    match pair.as_rule() {
        Rule::expr | Rule::conj | Rule::sum | Rule::product => eval_chain(pair, env),
        Rule::unary => {
            let mut negations = 0;
            let mut value = None;
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::neg => negations += 1,
                    _ => value = Some(eval(inner, env)?),
                }
            }
            let mut value = value.ok_or_else(|| anyhow!("Missing operand"))?;
            for _ in 0..negations {
                value = negate(value)?;
            }
            Ok(value)
        }
        Rule::primary => eval(next(&mut pair.into_inner())?, env),
        Rule::number => Ok(Value::Number(pair.as_str().parse()?)),
        Rule::vector => {
            let mut xyz = [0.0; 3];
            for (slot, inner) in xyz.iter_mut().zip(pair.into_inner()) {
                *slot = match eval(inner, env)? {
                    Value::Number(n) => n,
                    other => bail!("Vector components must be numbers, found a {}", other.kind()),
                };
            }
            Ok(Value::Vector(Vector3::from(xyz)))
        }
        Rule::ident => lookup(pair.as_str(), env),
        Rule::call => {
            let (line, col) = pair.as_span().start_pos().line_col();
            let mut inner = pair.into_inner();
            let name = next(&mut inner)?.as_str().to_string();
            let mut args = Args::default();
            for arg in inner {
                let arg = next(&mut arg.into_inner())?;
                match arg.as_rule() {
                    Rule::named_arg => {
                        let mut named = arg.into_inner();
                        let key = next(&mut named)?.as_str().to_string();
                        let value = eval(next(&mut named)?, env)?;
                        args.named.push((key, value));
                    }
                    _ => args.positional.push(eval(arg, env)?),
                }
            }
            call(&name, args)
                .with_context(|| format!("In `{}` at line {}, column {}", name, line, col))
        }
        rule => bail!("Unexpected {:?}", rule),
    }
}

/// Left-associative chain of operands separated by operator tokens
fn eval_chain(pair: Pair<Rule>, env: &AHashMap<String, Value>) -> Result<Value> {
    let mut inner = pair.into_inner();
    let mut acc = eval(next(&mut inner)?, env)?;
    while let Some(op) = inner.next() {
        let rhs = eval(next(&mut inner)?, env)?;
        acc = binary(op.as_rule(), acc, rhs)?;
    }
    Ok(acc)
}

fn binary(op: Rule, lhs: Value, rhs: Value) -> Result<Value> {
    use Value::*;
    let value = match (op, &lhs, &rhs) {
        (Rule::union_op, Shape(a), Shape(b)) => Shape(ops::union(a, b, 0.0)?),
        (Rule::inter_op, Shape(a), Shape(b)) => Shape(ops::intersection(a, b, 0.0)?),
        (Rule::sub, Shape(a), Shape(b)) => Shape(ops::difference(a, b, 0.0)?),
        (Rule::add, Number(a), Number(b)) => Number(a + b),
        (Rule::sub, Number(a), Number(b)) => Number(a - b),
        (Rule::mul, Number(a), Number(b)) => Number(a * b),
        (Rule::div, Number(a), Number(b)) => Number(a / b),
        (Rule::add, Vector(a), Vector(b)) => Vector(a + b),
        (Rule::sub, Vector(a), Vector(b)) => Vector(a - b),
        (Rule::mul, Vector(v), Number(s)) | (Rule::mul, Number(s), Vector(v)) => Vector(v * *s),
        (Rule::div, Vector(v), Number(s)) => Vector(v / *s),
        _ => bail!(
            "Cannot apply {} to a {} and a {}",
            operator_name(op),
            lhs.kind(),
            rhs.kind()
        ),
    };
    Ok(value)
}

fn operator_name(op: Rule) -> &'static str {
    match op {
        Rule::union_op => "`|`",
        Rule::inter_op => "`&`",
        Rule::add => "`+`",
        Rule::sub => "`-`",
        Rule::mul => "`*`",
        Rule::div => "`/`",
        _ => "operator",
    }
}

fn negate(value: Value) -> Result<Value> {
    match value {
        Value::Number(n) => Ok(Value::Number(-n)),
        Value::Vector(v) => Ok(Value::Vector(-v)),
        Value::Shape(_) => bail!("Cannot negate a shape"),
    }
}

fn lookup(name: &str, env: &AHashMap<String, Value>) -> Result<Value> {
    if let Some(value) = env.get(name) {
        return Ok(value.clone());
    }
    let value = match name {
        "X" => Value::Vector(math::X),
        "Y" => Value::Vector(math::Y),
        "Z" => Value::Vector(math::Z),
        "UP" => Value::Vector(math::UP),
        "ORIGIN" => Value::Vector(math::ORIGIN.coords),
        "PI" => Value::Number(math::PI),
        "TAU" => Value::Number(math::TAU),
        _ => bail!("Unknown name `{}`", name),
    };
    Ok(value)
}

/// Call arguments, consumed parameter by parameter
#[derive(Default)]
struct Args {
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
    cursor: usize,
}

impl Args {
    /// Named argument if given, else the next positional one
    fn take(&mut self, name: &str) -> Option<Value> {
        if let Some(i) = self.named.iter().position(|(key, _)| key == name) {
            return Some(self.named.remove(i).1);
        }
        let value = self.positional.get(self.cursor).cloned();
        if value.is_some() {
            self.cursor += 1;
        }
        value
    }

    fn required(&mut self, name: &str) -> Result<Value> {
        self.take(name)
            .ok_or_else(|| anyhow!("Missing argument `{}`", name))
    }

    fn number(&mut self, name: &str) -> Result<f64> {
        match self.required(name)? {
            Value::Number(n) => Ok(n),
            other => bail!("Argument `{}` must be a number, found a {}", name, other.kind()),
        }
    }

    fn number_or(&mut self, name: &str, default: f64) -> Result<f64> {
        match self.take(name) {
            None => Ok(default),
            Some(Value::Number(n)) => Ok(n),
            Some(other) => bail!("Argument `{}` must be a number, found a {}", name, other.kind()),
        }
    }

    fn optional_number(&mut self, name: &str) -> Result<Option<f64>> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(Some(n)),
            Some(other) => bail!("Argument `{}` must be a number, found a {}", name, other.kind()),
        }
    }

    fn vector(&mut self, name: &str) -> Result<Vector3<f64>> {
        match self.required(name)? {
            Value::Vector(v) => Ok(v),
            other => bail!("Argument `{}` must be a vector, found a {}", name, other.kind()),
        }
    }

    fn vector_or(&mut self, name: &str, default: Vector3<f64>) -> Result<Vector3<f64>> {
        match self.take(name) {
            None => Ok(default),
            Some(Value::Vector(v)) => Ok(v),
            Some(other) => bail!("Argument `{}` must be a vector, found a {}", name, other.kind()),
        }
    }

    fn point(&mut self, name: &str) -> Result<Point3<f64>> {
        self.vector(name).map(Point3::from)
    }

    fn shape(&mut self, name: &str) -> Result<Sdf> {
        match self.required(name)? {
            Value::Shape(s) => Ok(s),
            other => bail!("Argument `{}` must be a shape, found a {}", name, other.kind()),
        }
    }

    fn count(&mut self, name: &str) -> Result<u32> {
        let n = self.number(name)?;
        whole(name, n)
    }

    /// Fail on arguments no parameter consumed
    fn finish(self) -> Result<()> {
        if let Some((key, _)) = self.named.first() {
            bail!("Unknown argument `{}`", key);
        }
        if self.cursor < self.positional.len() {
            bail!(
                "Expected {} positional arguments, got {}",
                self.cursor,
                self.positional.len()
            );
        }
        Ok(())
    }
}

fn whole(name: &str, n: f64) -> Result<u32> {
    if !(0.0..=u32::MAX as f64).contains(&n) || n.fract() != 0.0 {
        bail!("Argument `{}` must be a whole number, found {}", name, n);
    }
    Ok(n as u32)
}

fn call(name: &str, mut args: Args) -> Result<Value> {
    let value = match name {
        // Primitives
        "sphere" => {
            let r = args.number("r")?;
            match args.take("center") {
                None => Value::Shape(ops::sphere(r)?),
                Some(Value::Vector(c)) => Value::Shape(ops::sphere_at(r, Point3::from(c))?),
                Some(other) => bail!("Argument `center` must be a vector, found a {}", other.kind()),
            }
        }
        "box" | "cuboid" => match args.required("size")? {
            Value::Number(half) => Value::Shape(ops::cube(half)?),
            Value::Vector(half) => Value::Shape(ops::cuboid(half)?),
            other => bail!("Argument `size` must be a number or vector, found a {}", other.kind()),
        },
        "cube" => Value::Shape(ops::cube(args.number("size")?)?),
        "rounded_box" => {
            let half = args.vector("size")?;
            Value::Shape(ops::rounded_box(half, args.number("r")?)?)
        }
        "torus" => {
            let major = args.number("major")?;
            Value::Shape(ops::torus(major, args.number("minor")?)?)
        }
        "capsule" => {
            let a = args.point("a")?;
            let b = args.point("b")?;
            Value::Shape(ops::capsule(a, b, args.number("r")?)?)
        }
        "cylinder" => Value::Shape(ops::cylinder(args.number("r")?)?),
        "capped_cylinder" => {
            let r = args.number("r")?;
            Value::Shape(ops::capped_cylinder(r, args.number("h")?)?)
        }
        "segment_cylinder" => {
            let a = args.point("a")?;
            let b = args.point("b")?;
            Value::Shape(ops::segment_cylinder(a, b, args.number("r")?)?)
        }
        "ellipsoid" => Value::Shape(ops::ellipsoid(args.vector("radii")?)?),
        "plane" => {
            let normal = args.vector_or("normal", math::UP)?;
            let point = args.vector_or("point", Vector3::zeros())?;
            Value::Shape(ops::plane(normal, Point3::from(point))?)
        }
        "slab" => {
            let mut axis = |lo: &str, hi: &str| -> Result<(Option<f64>, Option<f64>)> {
                Ok((args.optional_number(lo)?, args.optional_number(hi)?))
            };
            let x = axis("x0", "x1")?;
            let y = axis("y0", "y1")?;
            let z = axis("z0", "z1")?;
            Value::Shape(ops::slab(x, y, z)?)
        }
        "cone" => {
            let angle = args.number("angle")?;
            Value::Shape(ops::cone(angle, args.number("h")?)?)
        }
        "rounded_cone" => {
            let r1 = args.number("r1")?;
            let r2 = args.number("r2")?;
            Value::Shape(ops::rounded_cone(r1, r2, args.number("h")?)?)
        }
        "capped_cone" => {
            let a = args.point("a")?;
            let b = args.point("b")?;
            let ra = args.number("ra")?;
            Value::Shape(ops::capped_cone(a, b, ra, args.number("rb")?)?)
        }

        // Booleans
        "union" | "intersection" | "difference" => {
            let a = args.shape("a")?;
            let b = args.shape("b")?;
            let k = args.number_or("k", 0.0)?;
            let sdf = match name {
                "union" => ops::union(&a, &b, k)?,
                "intersection" => ops::intersection(&a, &b, k)?,
                _ => ops::difference(&a, &b, k)?,
            };
            Value::Shape(sdf)
        }
        "blend" => {
            let a = args.shape("a")?;
            let b = args.shape("b")?;
            Value::Shape(ops::blend(&a, &b, args.number_or("t", 0.5)?)?)
        }

        // Transforms
        "translate" => {
            let s = args.shape("shape")?;
            Value::Shape(ops::translate(&s, args.vector("offset")?)?)
        }
        "scale" => {
            let s = args.shape("shape")?;
            match args.required("factor")? {
                Value::Number(f) => Value::Shape(ops::scale(&s, f)?),
                Value::Vector(f) => Value::Shape(ops::scale_xyz(&s, f)?),
                other => bail!("Argument `factor` must be a number or vector, found a {}", other.kind()),
            }
        }
        "rotate" => {
            let s = args.shape("shape")?;
            let angle = args.number("angle")?;
            let axis = args.vector_or("axis", math::Z)?;
            Value::Shape(ops::rotate(&s, angle, axis)?)
        }
        "orient" => {
            let s = args.shape("shape")?;
            Value::Shape(ops::orient(&s, args.vector("direction")?)?)
        }
        "shear" => {
            let s = args.shape("shape")?;
            let xy = args.number_or("xy", 0.0)?;
            let xz = args.number_or("xz", 0.0)?;
            let yz = args.number_or("yz", 0.0)?;
            Value::Shape(ops::shear(&s, xy, xz, yz)?)
        }
        "twist" => {
            let s = args.shape("shape")?;
            Value::Shape(ops::twist(&s, args.number("k")?)?)
        }
        "bend" => {
            let s = args.shape("shape")?;
            Value::Shape(ops::bend(&s, args.number("k")?)?)
        }
        "elongate" => {
            let s = args.shape("shape")?;
            Value::Shape(ops::elongate(&s, args.vector("h")?)?)
        }
        "repeat" => {
            let s = args.shape("shape")?;
            let spacing = args.vector("spacing")?;
            let count = match args.take("count") {
                None => None,
                Some(Value::Number(n)) => Some([whole("count", n)?; 3]),
                Some(Value::Vector(v)) => Some([
                    whole("count", v.x)?,
                    whole("count", v.y)?,
                    whole("count", v.z)?,
                ]),
                Some(other) => bail!("Argument `count` must be a number or vector, found a {}", other.kind()),
            };
            Value::Shape(ops::repeat(&s, spacing, count)?)
        }
        "circular_array" => {
            let s = args.shape("shape")?;
            let count = args.count("count")?;
            let offset = args.number_or("offset", 0.0)?;
            Value::Shape(ops::circular_array(&s, count as usize, offset)?)
        }

        // Modifiers
        "dilate" => {
            let s = args.shape("shape")?;
            Value::Shape(ops::dilate(&s, args.number("r")?)?)
        }
        "erode" => {
            let s = args.shape("shape")?;
            Value::Shape(ops::erode(&s, args.number("r")?)?)
        }
        "shell" => {
            let s = args.shape("shape")?;
            Value::Shape(ops::shell(&s, args.number("thickness")?)?)
        }

        // Numbers
        "radians" => Value::Number(math::radians(args.number("degrees")?)),
        "degrees" => Value::Number(math::degrees(args.number("radians")?)),

        _ => bail!("Unknown function `{}`", name),
    };

    args.finish()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_single_shape() -> Result<()> {
        let s = parse_scene("sphere(1)")?;
        assert_relative_eq!(s.evaluate(&Point3::new(2.0, 0.0, 0.0)), 1.0);
        Ok(())
    }

    #[test]
    fn test_bindings_and_operators() -> Result<()> {
        let s = parse_scene(
            "// bracket with a hole
             let body = box([1, 1, 0.25]);
             let hole = capped_cylinder(0.5, 1);
             body - hole",
        )?;
        // Centre is drilled out, the corner is solid
        assert!(s.evaluate(&Point3::origin()) > 0.0);
        assert!(s.evaluate(&Point3::new(0.9, 0.9, 0.0)) < 0.0);
        Ok(())
    }

    #[test]
    fn test_precedence() -> Result<()> {
        // a | b & c - d parses as a | (b & (c - d))
        let s = parse_scene(
            "let a = sphere(0.5, center=[5, 0, 0]);
             let b = sphere(2);
             let c = sphere(1);
             let d = sphere(0.5);
             a | b & c - d",
        )?;
        assert!(s.evaluate(&Point3::new(5.0, 0.0, 0.0)) < 0.0);
        assert!(s.evaluate(&Point3::origin()) > 0.0);
        assert!(s.evaluate(&Point3::new(0.75, 0.0, 0.0)) < 0.0);
        assert!(s.evaluate(&Point3::new(1.5, 0.0, 0.0)) > 0.0);
        Ok(())
    }

    #[test]
    fn test_arithmetic_and_constants() -> Result<()> {
        let s = parse_scene("translate(sphere(0.5), X * 2 + -Y)")?;
        assert_relative_eq!(s.evaluate(&Point3::new(2.0, -1.0, 0.0)), -0.5);
        let r = parse_scene("rotate(box([2, 0.1, 0.1]), PI / 2, axis=Z)")?;
        assert!(r.evaluate(&Point3::new(0.0, 1.5, 0.0)) < 0.0);
        Ok(())
    }

    #[test]
    fn test_named_and_default_arguments() -> Result<()> {
        let smooth = parse_scene("union(sphere(1), translate(sphere(1), [1.5, 0, 0]), k=0.25)")?;
        let exact = parse_scene("union(sphere(1), translate(sphere(1), [1.5, 0, 0]))")?;
        let p = Point3::new(0.75, 0.9, 0.0);
        assert!(smooth.evaluate(&p) < exact.evaluate(&p));
        Ok(())
    }

    #[test]
    fn test_repeat_counts() -> Result<()> {
        let s = parse_scene("repeat(sphere(0.25), [1, 0, 0], count=1)")?;
        assert!(s.evaluate(&Point3::new(1.0, 0.0, 0.0)) < 0.0);
        assert!(s.evaluate(&Point3::new(3.0, 0.0, 0.0)) > 0.0);
        Ok(())
    }

    #[test]
    fn test_errors() {
        assert!(parse_scene("").is_err());
        assert!(parse_scene("sphere(").is_err());
        assert!(parse_scene("let r = 2; r").is_err());
        assert!(parse_scene("teapot(1)").is_err());
        assert!(parse_scene("sphere(1, 2)").is_err());
        assert!(parse_scene("sphere(1) - 1").is_err());
        assert!(parse_scene("sphere(-1)").is_err());

        let err = parse_scene("sphere(1) |\n  cube(r=1)").unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("line 2"), "{}", message);
        assert!(message.contains("`cube`"), "{}", message);
    }
}
