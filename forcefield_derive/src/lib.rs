/// Derive macro generating an implementation of the trait `HasBody`.
///
/// The body is the field marked with the `#[body]` attribute, or else the field named `body`.
#[proc_macro_derive(HasBody, attributes(body))]
pub fn has_body_derive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast = syn::parse(input);

    impl_has_body(ast).unwrap_or_else(|e| syn::Error::to_compile_error(&e).into())
}

fn impl_has_body(input: syn::Result<syn::DeriveInput>) -> syn::Result<proc_macro::TokenStream> {
    let input = input?;

    let name = &input.ident;
    let (member, ty) = get_body_field(&input.data)?;

    let mut generics = input.generics.clone();
    generics.params.push(syn::parse_quote!(const __N: usize));
    let (impl_generics, _, _) = generics.split_for_impl();

    let (_, ty_generics, where_clause) = input.generics.split_for_impl();
    let mut where_clause = where_clause
        .cloned()
        .unwrap_or_else(|| syn::parse_quote!(where));
    where_clause
        .predicates
        .push(syn::parse_quote!(#ty: ::forcefield::HasBody<__N>));

    Ok(quote::quote! {
        impl #impl_generics ::forcefield::HasBody<__N> for #name #ty_generics #where_clause {
            #[inline]
            fn body(&self) -> &::forcefield::Body<__N> {
                ::forcefield::HasBody::<__N>::body(&self.#member)
            }

            #[inline]
            fn body_mut(&mut self) -> &mut ::forcefield::Body<__N> {
                ::forcefield::HasBody::<__N>::body_mut(&mut self.#member)
            }
        }
    }
    .into())
}

fn get_body_field(data: &syn::Data) -> syn::Result<(syn::Member, syn::Type)> {
    match data {
        syn::Data::Struct(struct_data) => find_body(struct_data),
        syn::Data::Enum(enum_data) => Err(syn::Error::new_spanned(
            enum_data.enum_token,
            "the `HasBody` trait can only be derived for struct types",
        )),
        syn::Data::Union(union_data) => Err(syn::Error::new_spanned(
            union_data.union_token,
            "the `HasBody` trait can only be derived for struct types",
        )),
    }
}

fn find_body(struct_data: &syn::DataStruct) -> syn::Result<(syn::Member, syn::Type)> {
    let member = |index: usize, field: &syn::Field| match &field.ident {
        Some(ident) => syn::Member::Named(ident.clone()),
        None => syn::Member::Unnamed(syn::Index::from(index)),
    };

    let mut marked = struct_data
        .fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.attrs.iter().any(|attr| attr.path().is_ident("body")));

    if let Some((index, field)) = marked.next() {
        if let Some((_, other)) = marked.next() {
            return Err(syn::Error::new_spanned(
                other,
                "only one field can be marked with `#[body]`",
            ));
        }

        return Ok((member(index, field), field.ty.clone()));
    }

    struct_data
        .fields
        .iter()
        .enumerate()
        .find(|(_, field)| field.ident.as_ref().is_some_and(|ident| ident == "body"))
        .map(|(index, field)| (member(index, field), field.ty.clone()))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                &struct_data.fields,
                "no `body` field, mark the field holding the body with `#[body]`",
            )
        })
}
