//! Published descriptors of host types.
//!
//! Host types are not reflected at runtime. Each type publishes a
//! [`TypeDescriptor`] listing its constructors, operations and fields, with a
//! [`Kind`] for every parameter, return value and field. The bridge reads
//! these descriptors to resolve overloads and coerce arguments.
//!
//! Descriptors are built once with [`TypeBuilder`] and shared as
//! `Rc<TypeDescriptor>`. Operation order is declaration order, which is also
//! the order overload resolution tries candidates in.

use std::fmt;
use std::rc::Rc;

use crate::fault::HostFault;
use crate::kind::Kind;
use crate::value::HostValue;

/// Invocation thunk of an operation: `(receiver, arguments) -> result`.
///
/// Static operations and constructors receive the type value as receiver.
pub type OperationFn = Rc<dyn Fn(&HostValue, Vec<HostValue>) -> Result<HostValue, HostFault>>;

/// Field read accessor.
pub type FieldGetter = Rc<dyn Fn(&HostValue) -> Result<HostValue, HostFault>>;

/// Field write accessor. The value is already coerced to the field kind.
pub type FieldSetter = Rc<dyn Fn(&HostValue, HostValue) -> Result<(), HostFault>>;

/// Reserved member name of constructors.
pub const CONSTRUCTOR_NAME: &str = "new";

/// Operations every host object carries; never the sole operation of a
/// functional contract.
pub const UNIVERSAL_OPERATIONS: [&str; 3] = ["eq", "hash", "to_string"];

/// Whether an operation or field belongs to the type or to its instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Receiver {
    Static,
    Instance,
}

/// Signature of an operation, as used by block lists and adapter dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OperationRef {
    pub owner: String,
    pub name: String,
    pub params: Vec<Kind>,
}

impl OperationRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, params: Vec<Kind>) -> Self {
        OperationRef {
            owner: owner.into(),
            name: name.into(),
            params,
        }
    }

    /// Signature of a constructor of `owner`.
    pub fn constructor(owner: impl Into<String>, params: Vec<Kind>) -> Self {
        Self::new(owner, CONSTRUCTOR_NAME, params)
    }
}

impl fmt::Display for OperationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.owner, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ")")
    }
}

/// One published host operation.
#[derive(Clone)]
pub struct Operation {
    owner: String,
    name: String,
    params: Vec<Kind>,
    variadic: bool,
    returns: Kind,
    receiver: Receiver,
    hidden: bool,
    body: Option<OperationFn>,
}

impl Operation {
    fn with_receiver(name: impl Into<String>, params: Vec<Kind>, receiver: Receiver) -> Self {
        Operation {
            owner: String::new(),
            name: name.into(),
            params,
            variadic: false,
            returns: Kind::Void,
            receiver,
            hidden: false,
            body: None,
        }
    }

    /// Instance operation without a body yet.
    pub fn instance(name: impl Into<String>, params: Vec<Kind>) -> Self {
        Self::with_receiver(name, params, Receiver::Instance)
    }

    /// Static (type-level) operation.
    pub fn static_fn(name: impl Into<String>, params: Vec<Kind>) -> Self {
        Self::with_receiver(name, params, Receiver::Static)
    }

    /// Constructor. The return kind is set to the owner when the type is built.
    pub fn constructor(params: Vec<Kind>) -> Self {
        Self::with_receiver(CONSTRUCTOR_NAME, params, Receiver::Static)
    }

    /// Abstract contract operation; implementations come from adapters.
    pub fn abstract_op(name: impl Into<String>, params: Vec<Kind>, returns: Kind) -> Self {
        Self::instance(name, params).returns(returns)
    }

    /// Set the owner explicitly, for operations synthesized outside a
    /// [`TypeBuilder`]. Builders stamp the owner themselves.
    #[must_use]
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Mark the last parameter as a variadic slot. It must be an array kind.
    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    #[must_use]
    pub fn returns(mut self, kind: Kind) -> Self {
        self.returns = kind;
        self
    }

    /// Exclude from script-visible dispatch tables.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Attach the invocation thunk. On a contract operation this is the
    /// default body used when an adapter supplies no implementation.
    #[must_use]
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&HostValue, Vec<HostValue>) -> Result<HostValue, HostFault> + 'static,
    {
        self.body = Some(Rc::new(body));
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Kind] {
        &self.params
    }

    /// Whether the trailing array parameter accepts a variable argument count.
    pub fn is_variadic(&self) -> bool {
        self.variadic && matches!(self.params.last(), Some(Kind::Array(_)))
    }

    pub fn return_kind(&self) -> &Kind {
        &self.returns
    }

    pub fn receiver(&self) -> Receiver {
        self.receiver
    }

    pub fn is_static(&self) -> bool {
        self.receiver == Receiver::Static
    }

    pub fn is_constructor(&self) -> bool {
        self.is_static() && self.name == CONSTRUCTOR_NAME
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn signature(&self) -> OperationRef {
        OperationRef::new(self.owner.clone(), self.name.clone(), self.params.clone())
    }

    /// Invoke the operation on `this`.
    ///
    /// Instance operations on a script adapter are routed through the
    /// adapter with this exact signature, so script implementations take
    /// precedence over bodies.
    pub fn invoke(&self, this: &HostValue, args: Vec<HostValue>) -> Result<HostValue, HostFault> {
        if let HostValue::Adapter(adapter) = this {
            if !self.is_static() {
                return adapter.call(this, self, args);
            }
        }
        self.invoke_body(this, args)
    }

    /// Run the attached body directly, bypassing adapter routing.
    pub fn invoke_body(
        &self,
        this: &HostValue,
        args: Vec<HostValue>,
    ) -> Result<HostValue, HostFault> {
        match &self.body {
            Some(body) => body(this, args),
            None => Err(HostFault::new(format!(
                "operation {} has no body",
                self.signature()
            ))),
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("signature", &self.signature().to_string())
            .field("variadic", &self.variadic)
            .field("returns", &self.returns)
            .field("receiver", &self.receiver)
            .field("hidden", &self.hidden)
            .field("has_body", &self.has_body())
            .finish()
    }
}

/// A named, kinded property with a getter and optional setter.
#[derive(Clone)]
pub struct Field {
    name: String,
    kind: Kind,
    receiver: Receiver,
    getter: FieldGetter,
    setter: Option<FieldSetter>,
}

impl Field {
    /// Read-only instance field.
    pub fn new<G>(name: impl Into<String>, kind: Kind, getter: G) -> Self
    where
        G: Fn(&HostValue) -> Result<HostValue, HostFault> + 'static,
    {
        Field {
            name: name.into(),
            kind,
            receiver: Receiver::Instance,
            getter: Rc::new(getter),
            setter: None,
        }
    }

    /// Read-only static field; the getter receives the type value.
    pub fn static_field<G>(name: impl Into<String>, kind: Kind, getter: G) -> Self
    where
        G: Fn(&HostValue) -> Result<HostValue, HostFault> + 'static,
    {
        Field {
            receiver: Receiver::Static,
            ..Self::new(name, kind, getter)
        }
    }

    #[must_use]
    pub fn with_setter<S>(mut self, setter: S) -> Self
    where
        S: Fn(&HostValue, HostValue) -> Result<(), HostFault> + 'static,
    {
        self.setter = Some(Rc::new(setter));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn is_static(&self) -> bool {
        self.receiver == Receiver::Static
    }

    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }

    pub fn get(&self, this: &HostValue) -> Result<HostValue, HostFault> {
        (self.getter)(this)
    }

    pub fn set(&self, this: &HostValue, value: HostValue) -> Result<(), HostFault> {
        match &self.setter {
            Some(setter) => setter(this, value),
            None => Err(HostFault::new(format!("field `{}` is read-only", self.name))),
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("receiver", &self.receiver)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

/// What kind of host type a descriptor describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeFlavor {
    Class,
    /// A behavioral contract. Functional contracts may be satisfied by a
    /// single script function.
    Contract { functional: bool },
}

/// Published description of one host type.
pub struct TypeDescriptor {
    name: String,
    flavor: TypeFlavor,
    supertypes: Vec<String>,
    constructors: Vec<Operation>,
    operations: Vec<Operation>,
    fields: Vec<Field>,
}

impl TypeDescriptor {
    /// Start describing a concrete class.
    pub fn class(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder::new(name.into(), TypeFlavor::Class)
    }

    /// Start describing a contract.
    pub fn contract(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder::new(name.into(), TypeFlavor::Contract { functional: false })
    }

    /// Start describing a contract that a bare script function can satisfy.
    pub fn functional_contract(name: impl Into<String>) -> TypeBuilder {
        TypeBuilder::new(name.into(), TypeFlavor::Contract { functional: true })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flavor(&self) -> TypeFlavor {
        self.flavor
    }

    pub fn is_contract(&self) -> bool {
        matches!(self.flavor, TypeFlavor::Contract { .. })
    }

    pub fn is_functional(&self) -> bool {
        matches!(self.flavor, TypeFlavor::Contract { functional: true })
    }

    /// Names this type is directly assignable to, excluding itself.
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    pub fn constructors(&self) -> &[Operation] {
        &self.constructors
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Operations with the given name, in declaration order.
    pub fn operations_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Operation> {
        self.operations.iter().filter(move |op| op.name() == name)
    }

    pub fn instance_operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| !op.is_static())
    }

    pub fn static_operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| op.is_static())
    }

    pub fn field(&self, name: &str, receiver: Receiver) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.name() == name && field.receiver == receiver)
    }

    /// Direct assignability: the type itself or a declared supertype.
    pub fn is_assignable_to(&self, name: &str) -> bool {
        self.name == name || self.supertypes.iter().any(|s| s == name)
    }

    /// The operation a single script function implements when this contract
    /// is satisfied functionally.
    ///
    /// The first instance operation without a default body whose name is not
    /// one of [`UNIVERSAL_OPERATIONS`].
    pub fn functional_operation(&self) -> Option<&Operation> {
        if !self.is_functional() {
            return None;
        }
        self.instance_operations()
            .find(|op| !op.has_body() && !UNIVERSAL_OPERATIONS.contains(&op.name()))
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("flavor", &self.flavor)
            .field("supertypes", &self.supertypes)
            .field("constructors", &self.constructors.len())
            .field("operations", &self.operations.len())
            .field("fields", &self.fields.len())
            .finish()
    }
}

/// Builder for [`TypeDescriptor`].
pub struct TypeBuilder {
    name: String,
    flavor: TypeFlavor,
    supertypes: Vec<String>,
    constructors: Vec<Operation>,
    operations: Vec<Operation>,
    fields: Vec<Field>,
}

impl TypeBuilder {
    fn new(name: String, flavor: TypeFlavor) -> Self {
        TypeBuilder {
            name,
            flavor,
            supertypes: Vec::new(),
            constructors: Vec::new(),
            operations: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Declare a supertype (class or contract) this type is assignable to.
    #[must_use]
    pub fn implements(mut self, name: impl Into<String>) -> Self {
        self.supertypes.push(name.into());
        self
    }

    /// Add a constructor. Its name, receiver and return kind are normalized.
    #[must_use]
    pub fn constructor(mut self, mut op: Operation) -> Self {
        op.name = CONSTRUCTOR_NAME.to_string();
        op.receiver = Receiver::Static;
        op.returns = Kind::object(self.name.clone());
        self.constructors.push(op);
        self
    }

    #[must_use]
    pub fn operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Rc<TypeDescriptor> {
        let owner = self.name;
        let stamp = |mut op: Operation| {
            op.owner.clone_from(&owner);
            op
        };
        let constructors = self.constructors.into_iter().map(stamp).collect();
        let operations = self.operations.into_iter().map(stamp).collect();
        Rc::new(TypeDescriptor {
            name: owner,
            flavor: self.flavor,
            supertypes: self.supertypes,
            constructors,
            operations,
            fields: self.fields,
        })
    }
}
